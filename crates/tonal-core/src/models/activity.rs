use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Pounds.
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub total_workouts: i64,
    /// Seconds.
    #[serde(default)]
    pub total_duration: i64,
    #[serde(default)]
    pub total_external_activities: i64,
    /// Kilojoules.
    #[serde(default)]
    pub total_work: f64,
    #[serde(default)]
    pub total_time_under_tension: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStreak {
    pub user_id: String,
    #[serde(default)]
    pub current_streak: i64,
    pub current_streak_start_date: Option<String>,
    pub last_updated_week: Option<String>,
    #[serde(default)]
    pub max_streak: i64,
    pub max_streak_start_date: Option<String>,
    pub updated_by_activity_id: Option<String>,
}

/// One completed (or abandoned) workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: String,
    pub deleted_at: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub workout_id: String,
    #[serde(default)]
    pub is_in_program: bool,
    #[serde(default)]
    pub is_guided_workout: bool,
    pub timestamp: Option<String>,
    pub local_timestamp: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub target_area: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub time_under_tension: i64,
    pub rep_goal_percentage: Option<f64>,
    #[serde(default)]
    pub total_reps: i64,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub total_work: f64,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub workout_type: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub activity_type: String,
}

/// Lifetime totals. Nested sections vary by account, so the document is untyped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserStatistics(pub Map<String, Value>);

impl UserStatistics {
    /// Looks up a nested value, e.g. `stat(&["workouts", "total"])`.
    pub fn stat(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(key))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementCategory {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub category_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub achievement_category_id: String,
    pub achievement_category: Option<AchievementCategory>,
    #[serde(default)]
    pub asset_id: String,
    /// Milestone threshold; absent for badges.
    pub value: Option<f64>,
    #[serde(default)]
    pub icon_asset_id: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStats {
    #[serde(default)]
    pub total_achievements: i64,
    #[serde(default)]
    pub next_milestones: Vec<Achievement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedAchievement {
    pub id: String,
    pub achievement_id: String,
    pub user_id: String,
    pub created_at: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    pub workout_activity_id: Option<String>,
    pub achievement: Option<Achievement>,
    pub local_timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuscleUtilization {
    pub muscle_group: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSummaryData {
    pub workout_activity_id: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub work: f64,
    #[serde(default)]
    pub muscle_utilization: Vec<MuscleUtilization>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityStatus {
    pub status: String,
    pub locked_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarTile {
    #[serde(rename = "type")]
    pub tile_type: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: i64,
    pub completed: Option<bool>,
    #[serde(default)]
    pub workout_id: String,
    #[serde(default)]
    pub target_area: String,
    pub level: Option<String>,
    pub coach_id: Option<String>,
    #[serde(default)]
    pub accessories: Vec<String>,
    pub compatibility_status: Option<CompatibilityStatus>,
    pub workout_summary_data: Option<WorkoutSummaryData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    pub date: String,
    pub recommendation_type: Option<String>,
    #[serde(default)]
    pub tiles: Vec<CalendarTile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeCalendar {
    #[serde(default)]
    pub daily_schedules: Vec<DailySchedule>,
}

/// Readiness percentage (0-100) keyed by muscle group name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MuscleReadiness(pub BTreeMap<String, f64>);

impl MuscleReadiness {
    pub fn get(&self, muscle: &str) -> Option<f64> {
        self.0.get(muscle).copied()
    }

    /// The muscle group with the highest readiness.
    pub fn freshest(&self) -> Option<(&str, f64)> {
        self.0
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, value)| (name.as_str(), *value))
    }
}

/// Strength score targets. Shape is not stable across releases.
pub type TargetScores = Value;

/// Weekly metric scores. Shape is not stable across releases.
pub type MetricScores = Value;
