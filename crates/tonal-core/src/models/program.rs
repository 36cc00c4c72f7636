use serde::{Deserialize, Serialize};

use super::workout::Workout;

/// Where a workout sits within a program's schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramWorkout {
    pub id: String,
    pub program_id: String,
    pub workout_id: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub workout_number: i64,
    #[serde(default)]
    pub workout_title: String,
    #[serde(default)]
    pub program_week: i64,
    #[serde(default)]
    pub program_day: i64,
    #[serde(default)]
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramGoalScore {
    #[serde(rename = "goalID")]
    pub goal_id: String,
    pub score: f64,
    #[serde(rename = "goalMet")]
    pub goal_met: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub created_at: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workouts_per_week: i64,
    /// Workout days, Monday first.
    #[serde(default)]
    pub cadence: Vec<bool>,
    #[serde(default)]
    pub weeks: i64,
    #[serde(default)]
    pub publish_state: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub goal_ids: Vec<String>,
    #[serde(default)]
    pub coach_id: String,
    #[serde(default)]
    pub coach_ids: Vec<String>,
    #[serde(default)]
    pub is_adjustable: bool,
    #[serde(default)]
    pub program_workout_ids: Vec<String>,
    #[serde(default)]
    pub program_workouts: Vec<ProgramWorkout>,
    #[serde(default)]
    pub mobile_friendly: bool,
    #[serde(default)]
    pub supported_devices: Vec<String>,
    pub feature_group_ids: Option<Vec<String>>,
    #[serde(default)]
    pub training_effect_goals: Vec<ProgramGoalScore>,
}

impl Program {
    /// Scheduled workouts for a given program week, ordered by day.
    pub fn week(&self, week: i64) -> Vec<&ProgramWorkout> {
        let mut days: Vec<_> = self
            .program_workouts
            .iter()
            .filter(|w| w.program_week == week)
            .collect();
        days.sort_by_key(|w| (w.program_day, w.workout_number));
        days
    }
}
