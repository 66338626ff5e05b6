use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::activity::Activity;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ItemLocation {
    pub name: String,
    pub coordinates: (f64, f64),
}

/// A scheduled, time-bounded block within a day's plan.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")] // Use the "type" field to determine which variant to use
pub enum Event {
    #[serde(rename = "activity")]
    Activity {
        name: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
        activity_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<ItemLocation>,
    },

    #[serde(rename = "travel")]
    Travel {
        name: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
    },

    #[serde(rename = "meal")]
    Meal {
        name: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
    },

    #[serde(rename = "sleep")]
    Sleep {
        name: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        duration_hours: f64,
    },
}

fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_minutes() as f64 / 60.0
}

impl Event {
    pub fn activity(activity: &Activity, start: NaiveTime, end: NaiveTime) -> Self {
        Event::Activity {
            name: activity.name.clone(),
            start_time: start,
            end_time: end,
            duration_hours: activity.duration_hours,
            activity_id: activity.id.clone(),
            location: activity.location.map(|point| ItemLocation {
                name: activity.place_label(),
                coordinates: (point.lat, point.lng),
            }),
        }
    }

    pub fn travel(name: String, start: NaiveTime, end: NaiveTime) -> Self {
        Event::Travel {
            name,
            start_time: start,
            end_time: end,
            duration_hours: hours_between(start, end),
        }
    }

    pub fn meal(name: &str, start: NaiveTime, end: NaiveTime) -> Self {
        Event::Meal {
            name: name.to_string(),
            start_time: start,
            end_time: end,
            duration_hours: hours_between(start, end),
        }
    }

    /// The terminal rest block. It runs past midnight, so its end time is a
    /// next-morning time and `duration_hours` carries the real length.
    pub fn sleep(start: NaiveTime, end: NaiveTime, duration_hours: f64) -> Self {
        Event::Sleep {
            name: "Overnight rest".to_string(),
            start_time: start,
            end_time: end,
            duration_hours,
        }
    }

    pub fn start_time(&self) -> NaiveTime {
        match self {
            Event::Activity { start_time, .. }
            | Event::Travel { start_time, .. }
            | Event::Meal { start_time, .. }
            | Event::Sleep { start_time, .. } => *start_time,
        }
    }

    pub fn end_time(&self) -> NaiveTime {
        match self {
            Event::Activity { end_time, .. }
            | Event::Travel { end_time, .. }
            | Event::Meal { end_time, .. }
            | Event::Sleep { end_time, .. } => *end_time,
        }
    }

    pub fn is_sleep(&self) -> bool {
        matches!(self, Event::Sleep { .. })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DayPlan {
    pub day: u32,
    pub events: Vec<Event>,
}

/// An activity that could not be placed within any day's time budget.
/// Reported alongside the plan rather than silently dropped.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UnschedulableActivity {
    pub activity_id: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RouteResult {
    pub plan: Vec<DayPlan>,
    pub total_days: u32,
    pub optimization_score: f64,
    pub unschedulable: Vec<UnschedulableActivity>,
}
