//! Request and response schemas for the Tonal API.

pub mod activity;
pub mod movement;
pub mod program;
pub mod user;
pub mod workout;

pub use activity::{
    Achievement, AchievementCategory, AchievementStats, ActivitySummary, CalendarTile,
    CurrentStreak, DailyMetrics, DailySchedule, EarnedAchievement, HomeCalendar, MetricScores,
    MuscleReadiness, TargetScores, UserStatistics,
};
pub use movement::{Movement, MuscleGroup};
pub use program::{Program, ProgramWorkout};
pub use user::{
    Goal, GoalMetric, TrainingEffectGoals, TrainingType, UserDevice, UserInfo, UserPermissions,
    UserSettings, Visibility,
};
pub use workout::{
    CreatedSource, SharedWorkout, Workout, WorkoutCreateRequest, WorkoutEstimateResponse,
    WorkoutEstimateSet, WorkoutSet, WorkoutUpdateRequest, NO_COACH_ID,
};
