use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Sightseeing,
    Adventure,
    Culture,
    Relaxation,
    Wildlife,
    Dining,
    Shopping,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub category: ActivityCategory,
    /// Activities without coordinates are scheduled by duration only and
    /// contribute no inferred travel time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub location_name: String,
    #[serde(default)]
    pub district: String,
    pub duration_hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_start: Option<NaiveTime>,
}

impl Activity {
    pub fn duration_minutes(&self) -> i64 {
        (self.duration_hours * 60.0).round() as i64
    }

    /// Display name for the place the activity happens at.
    pub fn place_label(&self) -> String {
        match (self.location_name.is_empty(), self.district.is_empty()) {
            (false, false) => format!("{}, {}", self.location_name, self.district),
            (false, true) => self.location_name.clone(),
            (true, false) => self.district.clone(),
            (true, true) => self.name.clone(),
        }
    }
}
