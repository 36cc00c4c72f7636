use serde::{Deserialize, Serialize};

use super::movement::MuscleGroup;

/// Coach id used for user-built workouts that have no coach.
pub const NO_COACH_ID: &str = "00000000-0000-0000-0000-000000000000";

/// A set as stored on a saved workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: String,
    #[serde(default)]
    pub workout_id: String,
    pub movement_id: String,
    #[serde(default)]
    pub block_start: bool,
    #[serde(default)]
    pub prescribed_reps: i64,
    #[serde(default)]
    pub repetition: i64,
    #[serde(default)]
    pub repetition_total: i64,
    #[serde(default)]
    pub block_number: i64,
    #[serde(default)]
    pub burnout: bool,
    #[serde(default)]
    pub spotter: bool,
    #[serde(default)]
    pub eccentric: bool,
    #[serde(default)]
    pub chains: bool,
    #[serde(default)]
    pub flex: bool,
    #[serde(default)]
    pub warm_up: bool,
    #[serde(default)]
    pub drop_set: bool,
    #[serde(default)]
    pub weight_percentage: f64,
    #[serde(default)]
    pub duration_based_rep_goal: i64,
    #[serde(default)]
    pub set_group: i64,
    #[serde(default)]
    pub round: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub created_at: Option<String>,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub coach_id: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
    /// Seconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub publish_state: String,
    pub program_id: Option<String>,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub target_area: String,
    #[serde(default)]
    pub body_regions: Vec<MuscleGroup>,
    #[serde(rename = "type", default)]
    pub workout_type: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub training_type: String,
    #[serde(default)]
    pub movement_ids: Vec<String>,
    #[serde(default)]
    pub accessories: Vec<String>,
    #[serde(default)]
    pub playback_type: String,
    #[serde(default)]
    pub is_imported: bool,
}

impl Workout {
    pub fn duration_minutes(&self) -> i64 {
        (self.duration + 59) / 60
    }
}

/// A workout shared via a public link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedWorkout {
    pub id: String,
    pub sharer_user_id: String,
    pub parent_workout_id: String,
    pub workout_snapshot_id: String,
    #[serde(default)]
    pub workout_snapshot_hash: String,
    #[serde(default)]
    pub deep_link_url: String,
    pub workout_snapshot: Workout,
}

/// A set in a workout being built, estimated, created or updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutEstimateSet {
    pub block_start: bool,
    pub movement_id: String,
    /// Rep-based movements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_reps: Option<i64>,
    /// Time-based movements, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_duration: Option<i64>,
    pub drop_set: bool,
    pub repetition: i64,
    pub repetition_total: i64,
    pub block_number: i64,
    pub burnout: bool,
    pub spotter: bool,
    pub eccentric: bool,
    pub chains: bool,
    pub flex: bool,
    pub warm_up: bool,
    pub weight_percentage: f64,
    pub set_group: i64,
    pub round: i64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkoutEstimateResponse {
    /// Seconds.
    pub duration: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CreatedSource {
    #[default]
    WorkoutBuilder,
    FreeLift,
    SharedWorkout,
    DailyLift,
    TonalWorkout,
    WorkoutGenerator,
    ActivityFeed,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutCreateRequest {
    pub title: String,
    pub sets: Vec<WorkoutEstimateSet>,
    pub created_source: Option<CreatedSource>,
    pub short_description: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutUpdateRequest {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub coach_id: Option<String>,
    pub sets: Vec<WorkoutEstimateSet>,
    pub level: Option<String>,
    pub asset_id: String,
    pub created_source: Option<CreatedSource>,
}

/// Body sent for `POST /user-workouts`, with defaults filled in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWorkoutBody<'a> {
    pub title: &'a str,
    pub sets: &'a [WorkoutEstimateSet],
    pub created_source: CreatedSource,
    pub short_description: &'a str,
    pub description: &'a str,
}

impl<'a> From<&'a WorkoutCreateRequest> for CreateWorkoutBody<'a> {
    fn from(req: &'a WorkoutCreateRequest) -> Self {
        Self {
            title: &req.title,
            sets: &req.sets,
            created_source: req.created_source.unwrap_or_default(),
            short_description: req.short_description.as_deref().unwrap_or(""),
            description: req.description.as_deref().unwrap_or(""),
        }
    }
}

/// Body sent for `PUT /user-workouts/{id}`, with defaults filled in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateWorkoutBody<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub coach_id: &'a str,
    pub sets: &'a [WorkoutEstimateSet],
    pub level: &'a str,
    pub asset_id: &'a str,
    pub created_source: CreatedSource,
}

impl<'a> From<&'a WorkoutUpdateRequest> for UpdateWorkoutBody<'a> {
    fn from(req: &'a WorkoutUpdateRequest) -> Self {
        Self {
            id: &req.id,
            title: &req.title,
            description: req.description.as_deref().unwrap_or(""),
            coach_id: req.coach_id.as_deref().unwrap_or(NO_COACH_ID),
            sets: &req.sets,
            level: req.level.as_deref().unwrap_or(""),
            asset_id: &req.asset_id,
            created_source: req.created_source.unwrap_or_default(),
        }
    }
}
