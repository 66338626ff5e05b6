use serde::{Deserialize, Serialize};

use crate::models::activity::Activity;

/// Coordinates are collapsed at three decimal places (roughly 110 m) so that
/// near-identical points share a single cluster anchor.
pub const COORD_QUANTIZATION: f64 = 1000.0;

/// A deduplicated geographic anchor derived from activity coordinates.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

impl GeoLocation {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Quantize a coordinate pair to the dedup precision.
pub fn quantize(lat: f64, lng: f64) -> (i64, i64) {
    (
        (lat * COORD_QUANTIZATION).round() as i64,
        (lng * COORD_QUANTIZATION).round() as i64,
    )
}

/// Collapse activity coordinates into unique geo anchors, preserving
/// first-seen order. Activities without coordinates are skipped.
pub fn dedupe_locations(activities: &[Activity]) -> Vec<GeoLocation> {
    let mut seen: Vec<(i64, i64)> = Vec::new();
    let mut anchors = Vec::new();

    for activity in activities {
        if let Some(point) = activity.location {
            let key = quantize(point.lat, point.lng);
            if !seen.contains(&key) {
                seen.push(key);
                anchors.push(GeoLocation {
                    lat: point.lat,
                    lng: point.lng,
                    name: activity.place_label(),
                });
            }
        }
    }

    anchors
}
