//! Typed client for the Tonal REST API.
//!
//! `TonalClient` wraps a [`RequestExecutor`] with one method per endpoint.
//! Every call goes through the shared session, so expiry, renewal and
//! retries are handled below this layer.

use std::sync::Arc;

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::error::{ClientError, Result};
use super::executor::{RequestExecutor, RequestOptions};
use crate::auth::AuthSessionManager;
use crate::cache::CacheManager;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::models::workout::{CreateWorkoutBody, UpdateWorkoutBody};
use crate::models::{
    AchievementStats, ActivitySummary, CurrentStreak, DailyMetrics, EarnedAchievement, Goal,
    GoalMetric, HomeCalendar, MetricScores, Movement, MuscleReadiness, Program, SharedWorkout,
    TargetScores, TrainingEffectGoals, TrainingType, UserInfo, UserPermissions, UserSettings,
    UserStatistics, Workout, WorkoutCreateRequest, WorkoutEstimateResponse, WorkoutEstimateSet,
    WorkoutUpdateRequest,
};

// ============================================================================
// Constants
// ============================================================================

/// Public share links look like `https://share.tonal.com/workout/{id}`.
const SHARE_URL_PREFIX: &str = "https://share.tonal.com/workout/";

/// Default page size for the user's custom workouts.
pub const DEFAULT_WORKOUT_PAGE_SIZE: u32 = 50;

/// Default look-back window for daily metrics.
pub const DEFAULT_METRIC_DAYS: u32 = 60;

/// Time zone sent with daily lift requests when the caller gives none.
const DEFAULT_TIME_ZONE: &str = "UTC";

/// Build number the iOS app reports in its user agent.
const IOS_APP_BUILD: &str = "3004226";

/// CFNetwork version the iOS app reports in its user agent.
const IOS_CFNETWORK_VERSION: &str = "3860.100.1";

/// Client for one authenticated Tonal account.
pub struct TonalClient {
    executor: RequestExecutor,
    cache: Option<CacheManager>,
}

impl TonalClient {
    /// Build an unauthenticated client. Call [`TonalClient::authenticate`]
    /// before making requests, or use [`TonalClient::login`].
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| ClientError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        let cache = config.cache_dir.clone().and_then(|dir| {
            match CacheManager::with_clock(dir, config.cache_ttl, clock.clone()) {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!(error = %e, "Disabling response cache");
                    None
                }
            }
        });

        let config = Arc::new(config);
        let session = Arc::new(AuthSessionManager::with_clock(
            config.clone(),
            http.clone(),
            clock,
        ));
        let executor = RequestExecutor::new(&config, http, session);
        Ok(Self { executor, cache })
    }

    /// Create a client and sign in with the password grant.
    pub async fn login(config: ClientConfig, username: &str, password: &str) -> Result<Self> {
        let client = Self::new(config)?;
        client.authenticate(username, password).await?;
        Ok(client)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<()> {
        self.session().authenticate(username, password).await?;
        Ok(())
    }

    pub fn session(&self) -> &Arc<AuthSessionManager> {
        self.executor.session()
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.executor
            .request_json(Method::GET, endpoint, &RequestOptions::new())
            .await
    }

    /// Resolve the signed-in user's id for user-scoped endpoints.
    async fn user_id(&self) -> Result<String> {
        Ok(self.get_user_info().await?.id)
    }

    // ===== Movements =====

    /// The movement catalog, served from the on-disk cache when fresh.
    /// A fetched catalog is always written back, even when `use_cache` is false.
    pub async fn get_movements(&self, use_cache: bool) -> Result<Vec<Movement>> {
        if use_cache {
            if let Some(movements) = self.cache.as_ref().and_then(|c| c.load_movements()) {
                debug!(count = movements.len(), "Using cached movements");
                return Ok(movements);
            }
        }

        let movements: Vec<Movement> = self.get("/movements").await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save_movements(&movements) {
                warn!(error = %e, "Failed to cache movements");
            }
        }
        info!(count = movements.len(), "Fetched movements");
        Ok(movements)
    }

    pub fn invalidate_movements_cache(&self) -> anyhow::Result<()> {
        match &self.cache {
            Some(cache) => cache.invalidate_movements(),
            None => Ok(()),
        }
    }

    // ===== User =====

    pub async fn get_user_info(&self) -> Result<UserInfo> {
        self.get("/users/userinfo").await
    }

    pub async fn get_goals(&self) -> Result<Vec<Goal>> {
        self.get("/goals").await
    }

    pub async fn get_training_effect_goals(&self) -> Result<TrainingEffectGoals> {
        self.get("/training-effect-goals").await
    }

    pub async fn get_training_types(&self) -> Result<Vec<TrainingType>> {
        self.get("/training-types").await
    }

    pub async fn get_goal_metrics(&self) -> Result<Vec<GoalMetric>> {
        self.get("/goal-metrics").await
    }

    pub async fn get_user_settings(&self) -> Result<UserSettings> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/user-settings", user_id)).await
    }

    pub async fn get_user_permissions(&self) -> Result<UserPermissions> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/permissions", user_id)).await
    }

    pub async fn get_daily_metrics(&self, days: u32) -> Result<Vec<DailyMetrics>> {
        let user_id = self.user_id().await?;
        let options = RequestOptions::new().query("days", days);
        self.executor
            .request_json(
                Method::GET,
                &format!("/users/{}/metrics/daily", user_id),
                &options,
            )
            .await
    }

    pub async fn get_current_streak(&self) -> Result<CurrentStreak> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/streaks/current", user_id)).await
    }

    pub async fn get_activity_summaries(&self) -> Result<Vec<ActivitySummary>> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/activity-summaries", user_id))
            .await
    }

    pub async fn get_user_statistics(&self) -> Result<UserStatistics> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/statistics", user_id)).await
    }

    pub async fn get_achievement_stats(&self) -> Result<AchievementStats> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/achievement-stats", user_id))
            .await
    }

    pub async fn get_achievements(&self) -> Result<Vec<EarnedAchievement>> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/achievements", user_id)).await
    }

    pub async fn get_home_calendar(&self) -> Result<HomeCalendar> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/calendar/home", user_id)).await
    }

    pub async fn get_muscle_readiness(&self) -> Result<MuscleReadiness> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/muscle-readiness/current", user_id))
            .await
    }

    pub async fn get_target_scores(&self) -> Result<TargetScores> {
        let user_id = self.user_id().await?;
        self.get(&format!("/users/{}/target-scores", user_id)).await
    }

    pub async fn get_metric_scores(&self, start_week: Option<u32>) -> Result<MetricScores> {
        let user_id = self.user_id().await?;
        let mut options = RequestOptions::new();
        if let Some(week) = start_week {
            options = options.query("startWeek", week);
        }
        self.executor
            .request_json(
                Method::GET,
                &format!("/users/{}/metric-scores", user_id),
                &options,
            )
            .await
    }

    // ===== Programs =====

    pub async fn get_program_by_id(&self, program_id: &str) -> Result<Program> {
        let program_id = require_id(program_id, "Program ID is required")?;
        self.get(&format!("/programs/{}", program_id)).await
    }

    // ===== Workouts =====

    /// One page of the user's custom workouts.
    pub async fn get_user_workouts(&self, offset: u32, limit: u32) -> Result<Vec<Workout>> {
        let options = RequestOptions::new()
            .header("x-paginate-offset", offset.to_string())
            .header("x-paginate-limit", limit.to_string());
        self.executor
            .request_json(Method::GET, "/user-workouts", &options)
            .await
    }

    /// Today's recommended workouts. The backend tailors these to the
    /// device the user last used, so its identity is echoed in the headers.
    pub async fn get_daily_lifts(&self, time_zone: Option<&str>) -> Result<Vec<Workout>> {
        let user = self.get_user_info().await?;
        let device = &user.recent_mobile_device;
        let user_agent = if device.is_ios() {
            format!(
                "Tonal/{} CFNetwork/{} Darwin/{}",
                IOS_APP_BUILD, IOS_CFNETWORK_VERSION, device.os_version
            )
        } else {
            format!("Tonal/{}", device.app_version)
        };

        let options = RequestOptions::new()
            .query("types", "DailyLift")
            .header("Time-Zone", time_zone.unwrap_or(DEFAULT_TIME_ZONE))
            .header("AppVersion", device.app_version.as_str())
            .header("DeviceId", device.tonal_device_id.as_str())
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("User-Agent", user_agent);
        self.executor
            .request_json(Method::GET, "/user-workouts", &options)
            .await
    }

    pub async fn get_workout_by_id(&self, workout_id: &str) -> Result<Workout> {
        let workout_id = require_id(workout_id, "Workout ID is required")?;
        self.get(&format!("/workouts/{}", workout_id)).await
    }

    pub async fn get_workout_by_share_url(&self, share_url: &str) -> Result<SharedWorkout> {
        let share_url = require(share_url, "Share URL is required")?;
        let share_id = share_id_from_url(share_url)?;
        self.get(&format!("/user-workouts/sharing-records/{}", share_id))
            .await
    }

    pub async fn estimate_workout_duration(
        &self,
        sets: &[WorkoutEstimateSet],
    ) -> Result<WorkoutEstimateResponse> {
        if sets.is_empty() {
            return Err(ClientError::InvalidInput(
                "At least one set is required for estimation".to_string(),
            ));
        }
        let options = RequestOptions::new().json(json!({ "sets": sets }));
        self.executor
            .request_json(Method::POST, "/user-workouts/estimate", &options)
            .await
    }

    pub async fn create_workout(&self, request: &WorkoutCreateRequest) -> Result<Workout> {
        require(&request.title, "Workout title is required")?;
        require_sets(&request.sets)?;

        let body = to_json(&CreateWorkoutBody::from(request))?;
        let workout: Workout = self
            .executor
            .request_json(Method::POST, "/user-workouts", &RequestOptions::new().json(body))
            .await?;
        info!(workout_id = %workout.id, "Created workout");
        Ok(workout)
    }

    pub async fn update_workout(&self, request: &WorkoutUpdateRequest) -> Result<Workout> {
        let workout_id = require_id(&request.id, "Workout ID is required for updates")?;
        require(&request.title, "Workout title is required")?;
        require_sets(&request.sets)?;

        let body = to_json(&UpdateWorkoutBody::from(request))?;
        self.executor
            .request_json(
                Method::PUT,
                &format!("/user-workouts/{}", workout_id),
                &RequestOptions::new().json(body),
            )
            .await
    }

    pub async fn delete_workout(&self, workout_id: &str) -> Result<()> {
        let workout_id = require_id(workout_id, "Workout ID is required")?;
        self.executor
            .request_empty(
                Method::DELETE,
                &format!("/user-workouts/{}", workout_id),
                &RequestOptions::new(),
            )
            .await?;
        info!(workout_id, "Deleted workout");
        Ok(())
    }
}

/// Reject blank input before any network call.
fn require<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidInput(message.to_string()));
    }
    Ok(trimmed)
}

/// An id that is spliced into a URL path must stay a single segment.
fn require_id<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let id = require(value, message)?;
    if matches!(id, "." | "..") || id.contains(['/', '\\', '?', '#', '%']) {
        return Err(ClientError::InvalidInput(format!(
            "Invalid id {:?}: must be a single path segment",
            id
        )));
    }
    Ok(id)
}

fn require_sets(sets: &[WorkoutEstimateSet]) -> Result<()> {
    if sets.is_empty() {
        return Err(ClientError::InvalidInput(
            "At least one set is required".to_string(),
        ));
    }
    Ok(())
}

fn to_json<T: Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| ClientError::InvalidInput(format!("Failed to encode request body: {}", e)))
}

/// Pull the share id (lowercase hex and dashes) out of a share link.
fn share_id_from_url(url: &str) -> Result<&str> {
    let invalid = || {
        ClientError::InvalidInput(format!(
            "Invalid share URL format. Expected: {}{{id}}",
            SHARE_URL_PREFIX
        ))
    };

    let start = url.find(SHARE_URL_PREFIX).ok_or_else(invalid)? + SHARE_URL_PREFIX.len();
    let rest = &url[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || ('a'..='f').contains(&c) || c == '-'))
        .unwrap_or(rest.len());
    match &rest[..end] {
        "" => Err(invalid()),
        id => Ok(id),
    }
}
