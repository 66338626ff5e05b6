//! Route Planning Engine
//!
//! Turns a set of selected activities, their deduplicated geo anchors, and a
//! trip length in days into a day-partitioned, time-sequenced itinerary with
//! an optimization score.
//!
//! The engine is a pure computation: no I/O, no shared state, deterministic
//! for identical inputs (cluster tie-breaking uses a seeded RNG).
//!
//! ## Pipeline
//! 1. Validate inputs and deduplicate activities by id
//! 2. Cluster activities around geo anchors
//! 3. Distribute clusters across days, largest first (greedy bin-packing)
//! 4. Order each day's activities by proximity (nearest-neighbor + 2-opt)
//! 5. Lay out timed events: meals, travel blocks, buffers, terminal sleep
//! 6. Score the result

use std::collections::HashSet;

use chrono::{Duration, NaiveTime, Timelike};
use log::warn;
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::models::activity::Activity;
use crate::models::location::GeoLocation;
use crate::models::plan::{DayPlan, Event, RouteResult, UnschedulableActivity};
use crate::services::clustering_service::{cluster_activities, order_by_proximity, Cluster};
use crate::services::distance_service::travel_minutes;
use crate::services::scoring::{optimization_score, DayStats, ScoreWeights};

const DEFAULT_BREAKFAST_MINUTES: i64 = 30;
const DEFAULT_LUNCH_MINUTES: i64 = 45;
const DEFAULT_DINNER_MINUTES: i64 = 60;
const DEFAULT_BUFFER_MINUTES: i64 = 15;
const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;
const DEFAULT_MIN_TRAVEL_EVENT_MINUTES: i64 = 10;
const DEFAULT_CLUSTER_RADIUS_KM: f64 = 15.0;
const DEFAULT_REST_HOURS: f64 = 8.0;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("trip duration must be at least 1 day, got {0}")]
    InvalidDuration(u32),
    #[error("activity '{id}' has a non-positive duration")]
    InvalidActivityDuration { id: String },
    #[error("activity '{id}' has out-of-range coordinates ({lat}, {lng})")]
    InvalidCoordinates { id: String, lat: f64, lng: f64 },
}

#[derive(Debug, Clone)]
pub struct RoutePlanConfig {
    /// Opening of the operating window; breakfast starts here.
    pub day_start: NaiveTime,
    /// Lunch is placed at the first gap at or after this time.
    pub lunch_time: NaiveTime,
    /// Dinner never starts before this time; activities must end by it.
    pub dinner_time: NaiveTime,
    /// The terminal sleep block starts here.
    pub day_close: NaiveTime,
    pub breakfast_minutes: i64,
    pub lunch_minutes: i64,
    pub dinner_minutes: i64,
    /// Logistics buffer appended after every activity.
    pub buffer_minutes: i64,
    pub average_speed_kmh: f64,
    /// Transit shorter than this is folded into the buffer instead of
    /// becoming a travel event.
    pub min_travel_event_minutes: i64,
    /// Anchors closer than this are treated as one area for day assignment.
    pub cluster_radius_km: f64,
    /// Seed for cluster tie-breaking; fixed seed keeps plans reproducible.
    pub tie_break_seed: u64,
    /// Nominal rest length reported on the sleep event.
    pub rest_hours: f64,
}

impl Default for RoutePlanConfig {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            lunch_time: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            dinner_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            day_close: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            breakfast_minutes: DEFAULT_BREAKFAST_MINUTES,
            lunch_minutes: DEFAULT_LUNCH_MINUTES,
            dinner_minutes: DEFAULT_DINNER_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
            min_travel_event_minutes: DEFAULT_MIN_TRAVEL_EVENT_MINUTES,
            cluster_radius_km: DEFAULT_CLUSTER_RADIUS_KM,
            tie_break_seed: 0,
            rest_hours: DEFAULT_REST_HOURS,
        }
    }
}

impl RoutePlanConfig {
    /// Create a config from environment variables or use defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            day_start: parse_time_var("ROUTE_DAY_START").unwrap_or(defaults.day_start),
            lunch_time: parse_time_var("ROUTE_LUNCH_TIME").unwrap_or(defaults.lunch_time),
            dinner_time: parse_time_var("ROUTE_DINNER_TIME").unwrap_or(defaults.dinner_time),
            day_close: parse_time_var("ROUTE_DAY_CLOSE").unwrap_or(defaults.day_close),
            breakfast_minutes: parse_num_var("ROUTE_BREAKFAST_MINUTES")
                .unwrap_or(defaults.breakfast_minutes),
            lunch_minutes: parse_num_var("ROUTE_LUNCH_MINUTES").unwrap_or(defaults.lunch_minutes),
            dinner_minutes: parse_num_var("ROUTE_DINNER_MINUTES")
                .unwrap_or(defaults.dinner_minutes),
            buffer_minutes: parse_num_var("ROUTE_BUFFER_MINUTES")
                .unwrap_or(defaults.buffer_minutes),
            average_speed_kmh: parse_num_var("ROUTE_AVG_SPEED_KMH")
                .unwrap_or(defaults.average_speed_kmh),
            min_travel_event_minutes: parse_num_var("ROUTE_MIN_TRAVEL_EVENT_MINUTES")
                .unwrap_or(defaults.min_travel_event_minutes),
            cluster_radius_km: parse_num_var("ROUTE_CLUSTER_RADIUS_KM")
                .unwrap_or(defaults.cluster_radius_km),
            tie_break_seed: parse_num_var("ROUTE_TIE_BREAK_SEED")
                .unwrap_or(defaults.tie_break_seed),
            rest_hours: parse_num_var("ROUTE_REST_HOURS").unwrap_or(defaults.rest_hours),
        }
    }

    /// Minutes per day available for activities and travel: the window up to
    /// dinner, minus breakfast and lunch.
    pub fn usable_minutes(&self) -> i64 {
        let window = minutes_of(self.dinner_time) - minutes_of(self.day_start);
        window - self.breakfast_minutes - self.lunch_minutes
    }
}

fn parse_time_var(name: &str) -> Option<NaiveTime> {
    std::env::var(name)
        .ok()
        .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M").ok())
}

fn parse_num_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn minutes_of(time: NaiveTime) -> i64 {
    (time.num_seconds_from_midnight() / 60) as i64
}

struct DayBin {
    remaining: i64,
    activities: Vec<Activity>,
    anchor: Option<(f64, f64)>,
}

#[derive(Clone)]
pub struct RoutePlanner {
    config: RoutePlanConfig,
    weights: ScoreWeights,
}

impl Default for RoutePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self {
            config: RoutePlanConfig::default(),
            weights: ScoreWeights::default(),
        }
    }

    pub fn from_env() -> Self {
        Self {
            config: RoutePlanConfig::from_env(),
            weights: ScoreWeights::from_env(),
        }
    }

    pub fn with_config(config: RoutePlanConfig, weights: ScoreWeights) -> Self {
        Self { config, weights }
    }

    /// Generate a day-partitioned route plan for the selected activities.
    ///
    /// Every schedulable activity lands in exactly one day; activities that
    /// cannot fit any day's budget are reported in `unschedulable`. The plan
    /// always contains exactly `duration_days` days.
    pub fn generate_route_plan(
        &self,
        activities: &[Activity],
        locations: &[GeoLocation],
        duration_days: u32,
    ) -> Result<RouteResult, RouteError> {
        if duration_days < 1 {
            return Err(RouteError::InvalidDuration(duration_days));
        }

        let activities = self.validate_and_dedupe(activities)?;
        let mut rng = StdRng::seed_from_u64(self.config.tie_break_seed);
        let clusters =
            cluster_activities(&activities, locations, self.config.cluster_radius_km, &mut rng);

        let mut unschedulable = Vec::new();
        let bins = self.assign_days(clusters, duration_days, &mut unschedulable);

        let mut plan = Vec::with_capacity(bins.len());
        let mut stats = Vec::with_capacity(bins.len());
        for (idx, bin) in bins.into_iter().enumerate() {
            let ordered = order_by_proximity(bin.activities, bin.anchor);
            let (day_plan, day_stats) =
                self.lay_out_day(idx as u32 + 1, ordered, &mut unschedulable);
            plan.push(day_plan);
            stats.push(day_stats);
        }

        let score = optimization_score(&stats, &self.weights);

        Ok(RouteResult {
            plan,
            total_days: duration_days,
            optimization_score: score,
            unschedulable,
        })
    }

    fn validate_and_dedupe(&self, activities: &[Activity]) -> Result<Vec<Activity>, RouteError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut valid = Vec::with_capacity(activities.len());

        for activity in activities {
            if !activity.duration_hours.is_finite() || activity.duration_hours <= 0.0 {
                return Err(RouteError::InvalidActivityDuration {
                    id: activity.id.clone(),
                });
            }
            if let Some(point) = activity.location {
                let lat_ok = point.lat.is_finite() && (-90.0..=90.0).contains(&point.lat);
                let lng_ok = point.lng.is_finite() && (-180.0..=180.0).contains(&point.lng);
                if !lat_ok || !lng_ok {
                    return Err(RouteError::InvalidCoordinates {
                        id: activity.id.clone(),
                        lat: point.lat,
                        lng: point.lng,
                    });
                }
            }
            if seen.insert(activity.id.as_str()) {
                valid.push(activity.clone());
            } else {
                warn!("Duplicate activity id '{}' ignored", activity.id);
            }
        }

        Ok(valid)
    }

    /// Distribute clusters across days, largest first, so no day's packed
    /// time exceeds the usable budget. Activities that fit nowhere are
    /// reported instead of forced into an overflowing day.
    fn assign_days(
        &self,
        mut clusters: Vec<Cluster>,
        duration_days: u32,
        unschedulable: &mut Vec<UnschedulableActivity>,
    ) -> Vec<DayBin> {
        let budget = self.config.usable_minutes();
        let mut bins: Vec<DayBin> = (0..duration_days)
            .map(|_| DayBin {
                remaining: budget,
                activities: Vec::new(),
                anchor: None,
            })
            .collect();

        clusters.sort_by(|a, b| {
            b.total_minutes()
                .cmp(&a.total_minutes())
                .then_with(|| first_id(a).cmp(first_id(b)))
        });

        let mut spill: Vec<Activity> = Vec::new();

        for cluster in clusters {
            let target = roomiest_bin(&bins);
            let anchor = cluster.anchor.as_ref().map(|a| a.coordinates());

            let mut members = cluster.activities;
            members.sort_by(|a, b| {
                b.duration_minutes()
                    .cmp(&a.duration_minutes())
                    .then_with(|| a.id.cmp(&b.id))
            });

            for activity in members {
                let cost = activity.duration_minutes() + self.config.buffer_minutes;
                if cost <= bins[target].remaining {
                    bins[target].remaining -= cost;
                    if bins[target].anchor.is_none() {
                        bins[target].anchor = anchor;
                    }
                    bins[target].activities.push(activity);
                } else {
                    spill.push(activity);
                }
            }
        }

        for activity in spill {
            let cost = activity.duration_minutes() + self.config.buffer_minutes;
            let candidate = roomiest_bin(&bins);
            if cost <= bins[candidate].remaining {
                bins[candidate].remaining -= cost;
                bins[candidate].activities.push(activity);
            } else {
                let reason = if cost > budget {
                    "duration exceeds the daily time budget".to_string()
                } else {
                    "no remaining capacity across the itinerary".to_string()
                };
                unschedulable.push(UnschedulableActivity {
                    activity_id: activity.id.clone(),
                    name: activity.name.clone(),
                    reason,
                });
            }
        }

        bins
    }

    /// Lay out one day's events on the clock: breakfast, activities with
    /// travel blocks and buffers, lunch at the first gap past its canonical
    /// time, dinner after the last activity, and the terminal sleep block.
    fn lay_out_day(
        &self,
        day: u32,
        ordered: Vec<Activity>,
        unschedulable: &mut Vec<UnschedulableActivity>,
    ) -> (DayPlan, DayStats) {
        let cfg = &self.config;
        let mut events = Vec::new();
        let mut stats = DayStats::default();

        let breakfast_end = cfg.day_start + Duration::minutes(cfg.breakfast_minutes);
        events.push(Event::meal("Breakfast", cfg.day_start, breakfast_end));

        let mut cursor = breakfast_end;
        let mut lunch_placed = false;
        let mut prev_coords: Option<(f64, f64)> = None;

        for activity in ordered {
            if !lunch_placed && cursor >= cfg.lunch_time {
                let lunch_end = cursor + Duration::minutes(cfg.lunch_minutes);
                events.push(Event::meal("Lunch", cursor, lunch_end));
                cursor = lunch_end;
                lunch_placed = true;
            }

            let transit = match (prev_coords, activity.location) {
                (Some(from), Some(to)) => {
                    travel_minutes(from, (to.lat, to.lng), cfg.average_speed_kmh)
                }
                _ => 0,
            };
            let needs_travel_event = transit >= cfg.min_travel_event_minutes;

            let after_travel = if needs_travel_event {
                cursor + Duration::minutes(transit)
            } else {
                cursor
            };

            // Overflow checks run on minutes from midnight; NaiveTime
            // addition wraps and would let a late block slip past the guard.
            let dinner_boundary = minutes_of(cfg.dinner_time);
            let mut start = after_travel;
            if let Some(preferred) = activity.preferred_start {
                // A later preference shifts the activity when the shifted
                // placement still ends by dinner; otherwise it stays in
                // packed order. An earlier preference is always ignored.
                if preferred > start
                    && minutes_of(preferred) + activity.duration_minutes() <= dinner_boundary
                {
                    start = preferred;
                }
            }

            if minutes_of(start) + activity.duration_minutes() > dinner_boundary {
                unschedulable.push(UnschedulableActivity {
                    activity_id: activity.id.clone(),
                    name: activity.name.clone(),
                    reason: format!("does not fit in the remaining window of day {}", day),
                });
                continue;
            }
            let end = start + Duration::minutes(activity.duration_minutes());

            if needs_travel_event {
                events.push(Event::travel(
                    format!("Travel to {}", activity.name),
                    cursor,
                    after_travel,
                ));
                stats.travel_minutes += transit;
                cursor = after_travel;
            }

            // A preferred-start wait can host lunch
            if !lunch_placed {
                let lunch_start = cursor.max(cfg.lunch_time);
                let lunch_end = lunch_start + Duration::minutes(cfg.lunch_minutes);
                if lunch_end <= start {
                    stats.idle_minutes += (lunch_start - cursor).num_minutes();
                    events.push(Event::meal("Lunch", lunch_start, lunch_end));
                    cursor = lunch_end;
                    lunch_placed = true;
                }
            }

            if start > cursor {
                stats.idle_minutes += (start - cursor).num_minutes();
            }

            events.push(Event::activity(&activity, start, end));
            stats.activity_minutes += activity.duration_minutes();
            cursor = end + Duration::minutes(cfg.buffer_minutes);
            stats.buffer_minutes += cfg.buffer_minutes;

            if let Some(point) = activity.location {
                prev_coords = Some((point.lat, point.lng));
            }
        }

        if !lunch_placed {
            let lunch_start = cursor.max(cfg.lunch_time);
            let lunch_end = lunch_start + Duration::minutes(cfg.lunch_minutes);
            events.push(Event::meal("Lunch", lunch_start, lunch_end));
            cursor = lunch_end;
        }

        let dinner_start = cursor.max(cfg.dinner_time);
        let dinner_end = dinner_start + Duration::minutes(cfg.dinner_minutes);
        events.push(Event::meal("Dinner", dinner_start, dinner_end));

        let rest_end = rest_end_time(cfg.day_close, cfg.rest_hours);
        events.push(Event::sleep(cfg.day_close, rest_end, cfg.rest_hours));

        (DayPlan { day, events }, stats)
    }
}

fn rest_end_time(day_close: NaiveTime, rest_hours: f64) -> NaiveTime {
    day_close + Duration::minutes((rest_hours * 60.0).round() as i64)
}

fn first_id(cluster: &Cluster) -> &str {
    cluster
        .activities
        .first()
        .map(|a| a.id.as_str())
        .unwrap_or("")
}

/// Index of the day with the most remaining budget; earlier days win ties so
/// assignment stays deterministic.
fn roomiest_bin(bins: &[DayBin]) -> usize {
    let mut best = 0;
    for (idx, bin) in bins.iter().enumerate() {
        if bin.remaining > bins[best].remaining {
            best = idx;
        }
    }
    best
}
