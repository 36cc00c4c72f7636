use serde::{Deserialize, Serialize};

/// Muscle groups the backend tags movements and workouts with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuscleGroup {
    Obliques,
    Abs,
    Shoulders,
    Glutes,
    Back,
    Biceps,
    Quads,
    Triceps,
    Chest,
    Hamstrings,
    Calves,
    Forearms,
    #[serde(other)]
    Other,
}

/// An exercise from the movement catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    pub name: String,
    #[serde(rename = "shortName", default)]
    pub short_name: String,
    #[serde(rename = "muscleGroups", default)]
    pub muscle_groups: Vec<MuscleGroup>,
    #[serde(rename = "bodyRegion", default)]
    pub body_region: String,
    #[serde(rename = "bodyRegionDisplay", default)]
    pub body_region_display: String,
    #[serde(rename = "baseOfSupport", default)]
    pub base_of_support: String,
    #[serde(rename = "pushPull", default)]
    pub push_pull: String,
    #[serde(default)]
    pub family: String,
    #[serde(rename = "familyDisplay", default)]
    pub family_display: String,
    #[serde(rename = "inFreeLift", default)]
    pub in_free_lift: bool,
    #[serde(rename = "onMachine", default)]
    pub on_machine: bool,
    #[serde(rename = "countReps", default)]
    pub count_reps: bool,
    #[serde(rename = "isTwoSided", default)]
    pub is_two_sided: bool,
    #[serde(rename = "isBilateral", default)]
    pub is_bilateral: bool,
    #[serde(rename = "isAlternating", default)]
    pub is_alternating: bool,
    #[serde(rename = "offMachineAccessory", default)]
    pub off_machine_accessory: String,
    #[serde(rename = "descriptionHow", default)]
    pub description_how: String,
    #[serde(rename = "descriptionWhy", default)]
    pub description_why: String,
    #[serde(rename = "sortOrder", default)]
    pub sort_order: i64,
    #[serde(rename = "imageAssetId", default)]
    pub image_asset_id: String,
    #[serde(rename = "skillLevel", default)]
    pub skill_level: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "featureGroupIds")]
    pub feature_group_ids: Option<Vec<String>>,
    #[serde(rename = "isGeneric", default)]
    pub is_generic: bool,
}

impl Movement {
    pub fn targets(&self, group: &MuscleGroup) -> bool {
        self.muscle_groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movement_with_unknown_muscle_group() {
        let json = r#"{"id":"0f4c1b5e","name":"Bench Press","shortName":"Bench","muscleGroups":["Chest","Triceps","Neck"],"bodyRegion":"UPPER","onMachine":true,"featureGroupIds":null,"skillLevel":2,"active":true}"#;
        let movement: Movement = serde_json::from_str(json).expect("parse movement");
        assert_eq!(movement.name, "Bench Press");
        assert!(movement.targets(&MuscleGroup::Chest));
        assert!(movement.targets(&MuscleGroup::Other));
        assert!(!movement.targets(&MuscleGroup::Quads));
        assert!(movement.feature_group_ids.is_none());
    }
}
