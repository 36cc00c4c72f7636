use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The mobile device most recently paired with the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDevice {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub tonal_device_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub logged_in: bool,
}

impl UserDevice {
    pub fn is_ios(&self) -> bool {
        self.platform == "ios"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGoal {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "goalID")]
    pub goal_id: String,
    /// 1 is the highest priority.
    pub tier: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub height_inches: f64,
    #[serde(default)]
    pub weight_pounds: f64,
    #[serde(default)]
    pub auth0_id: String,
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub is_guest_account: bool,
    #[serde(default)]
    pub is_demo_account: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub recent_mobile_device: UserDevice,
    #[serde(default)]
    pub workouts_per_week: i64,
    #[serde(default)]
    pub tonal_status: String,
    #[serde(rename = "profileAssetID")]
    pub profile_asset_id: Option<String>,
    #[serde(default)]
    pub mobile_workouts_enabled: bool,
    #[serde(default)]
    pub account_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub goal_id: String,
    #[serde(default)]
    pub goals: Vec<UserGoal>,
    /// Seconds.
    #[serde(default)]
    pub workout_duration_min: i64,
    /// Seconds.
    #[serde(default)]
    pub workout_duration_max: i64,
    #[serde(default)]
    pub primary_device_type: String,
}

impl UserInfo {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

/// Per-section privacy settings, keyed by section name (`streak`, `workouts`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    pub user_id: String,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Visibility>,
}

impl UserPermissions {
    pub fn is_public(&self, section: &str) -> bool {
        self.sections.get(section) == Some(&Visibility::Public)
    }
}

/// Audio, display and onboarding flags. The document carries well over a
/// hundred keys that change between app releases, so it is kept untyped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSettings(pub Map<String, Value>);

impl UserSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.get("timeZone").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub filter_item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingEffectGoalRelation {
    pub id: String,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub tertiary: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingEffectGoals {
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub relations: Vec<TrainingEffectGoalRelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub info_vid_id: String,
    #[serde(default)]
    pub filter_item_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetric {
    pub id: String,
    pub name: String,
    pub goal_id: String,
    #[serde(default)]
    pub description: String,
}
