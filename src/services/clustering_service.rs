//! Spatial clustering and intra-day sequencing.
//!
//! Activities are grouped around deduplicated geo anchors so that a single
//! day's schedule stays within one area. Within a day, activities are ordered
//! with a nearest-neighbor pass followed by a 2-opt improvement sweep.

use rand::{rngs::StdRng, Rng};

use crate::models::activity::Activity;
use crate::models::location::{dedupe_locations, GeoLocation};
use crate::services::distance_service::haversine_km;

const DISTANCE_TIE_EPSILON_KM: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Cluster {
    /// None for the pool of activities without coordinates.
    pub anchor: Option<GeoLocation>,
    pub activities: Vec<Activity>,
}

impl Cluster {
    pub fn total_minutes(&self) -> i64 {
        self.activities.iter().map(|a| a.duration_minutes()).sum()
    }
}

/// Group activities by their nearest geo anchor, then merge clusters whose
/// anchors sit within `radius_km` of each other so one area stays on one
/// day. When the caller supplies no anchors they are derived from the
/// activities themselves. Exact distance ties are resolved with the seeded
/// RNG so results stay reproducible.
pub fn cluster_activities(
    activities: &[Activity],
    locations: &[GeoLocation],
    radius_km: f64,
    rng: &mut StdRng,
) -> Vec<Cluster> {
    let anchors = if locations.is_empty() {
        dedupe_locations(activities)
    } else {
        locations.to_vec()
    };

    let mut clusters: Vec<Cluster> = anchors
        .iter()
        .map(|anchor| Cluster {
            anchor: Some(anchor.clone()),
            activities: Vec::new(),
        })
        .collect();
    let mut unanchored = Cluster {
        anchor: None,
        activities: Vec::new(),
    };

    for activity in activities {
        match activity.location {
            Some(point) if !anchors.is_empty() => {
                let idx = nearest_anchor((point.lat, point.lng), &anchors, rng);
                clusters[idx].activities.push(activity.clone());
            }
            _ => unanchored.activities.push(activity.clone()),
        }
    }

    clusters.retain(|cluster| !cluster.activities.is_empty());
    let mut clusters = merge_nearby_clusters(clusters, radius_km);
    if !unanchored.activities.is_empty() {
        clusters.push(unanchored);
    }

    clusters
}

/// Greedy agglomeration: repeatedly merge the closest pair of clusters whose
/// anchors are within the radius. The lower-indexed cluster keeps its anchor.
fn merge_nearby_clusters(mut clusters: Vec<Cluster>, radius_km: f64) -> Vec<Cluster> {
    loop {
        let mut closest: Option<(usize, usize, f64)> = None;
        for i in 0..clusters.len() {
            for j in i + 1..clusters.len() {
                let a = clusters[i].anchor.as_ref().unwrap().coordinates();
                let b = clusters[j].anchor.as_ref().unwrap().coordinates();
                let km = haversine_km(a, b);
                if km <= radius_km && closest.map_or(true, |(_, _, best)| km < best) {
                    closest = Some((i, j, km));
                }
            }
        }

        match closest {
            Some((i, j, _)) => {
                let absorbed = clusters.remove(j);
                clusters[i].activities.extend(absorbed.activities);
            }
            None => return clusters,
        }
    }
}

fn nearest_anchor(point: (f64, f64), anchors: &[GeoLocation], rng: &mut StdRng) -> usize {
    let mut best_indices = vec![0];
    let mut best_distance = f64::MAX;

    for (idx, anchor) in anchors.iter().enumerate() {
        let distance = haversine_km(point, anchor.coordinates());
        if distance + DISTANCE_TIE_EPSILON_KM < best_distance {
            best_distance = distance;
            best_indices = vec![idx];
        } else if (distance - best_distance).abs() <= DISTANCE_TIE_EPSILON_KM {
            best_indices.push(idx);
        }
    }

    if best_indices.len() == 1 {
        best_indices[0]
    } else {
        best_indices[rng.gen_range(0..best_indices.len())]
    }
}

/// Order a day's activities to minimize inferred travel. Activities without
/// coordinates keep their input order at the end of the day.
pub fn order_by_proximity(
    activities: Vec<Activity>,
    start: Option<(f64, f64)>,
) -> Vec<Activity> {
    let (geo, tail): (Vec<Activity>, Vec<Activity>) = activities
        .into_iter()
        .partition(|a| a.location.is_some());

    let mut route = nearest_neighbor_order(geo, start);
    two_opt(&mut route);
    route.extend(tail);
    route
}

fn nearest_neighbor_order(
    mut unvisited: Vec<Activity>,
    start: Option<(f64, f64)>,
) -> Vec<Activity> {
    let mut route = Vec::with_capacity(unvisited.len());
    let mut current = start;

    while !unvisited.is_empty() {
        let next_idx = match current {
            Some(from) => {
                let mut nearest_idx = 0;
                let mut nearest_km = f64::MAX;
                for (idx, candidate) in unvisited.iter().enumerate() {
                    let point = candidate.location.unwrap();
                    let km = haversine_km(from, (point.lat, point.lng));
                    if km < nearest_km {
                        nearest_km = km;
                        nearest_idx = idx;
                    }
                }
                nearest_idx
            }
            None => 0,
        };

        let next = unvisited.remove(next_idx);
        current = next.location.map(|p| (p.lat, p.lng));
        route.push(next);
    }

    route
}

fn path_km(route: &[Activity]) -> f64 {
    route
        .windows(2)
        .map(|pair| {
            let a = pair[0].location.unwrap();
            let b = pair[1].location.unwrap();
            haversine_km((a.lat, a.lng), (b.lat, b.lng))
        })
        .sum()
}

/// Single 2-opt improvement loop over the day's route, bounded to keep the
/// pass cheap for the small activity counts seen in practice.
fn two_opt(route: &mut Vec<Activity>) {
    if route.len() < 4 {
        return;
    }

    let mut improved = true;
    let mut passes = 0;
    while improved && passes < 10 {
        improved = false;
        passes += 1;
        for i in 0..route.len() - 1 {
            for j in i + 2..route.len() {
                let before = path_km(route);
                route[i + 1..=j].reverse();
                if path_km(route) + DISTANCE_TIE_EPSILON_KM < before {
                    improved = true;
                } else {
                    route[i + 1..=j].reverse();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::{ActivityCategory, GeoPoint};
    use rand::SeedableRng;

    fn activity(id: &str, coords: Option<(f64, f64)>) -> Activity {
        Activity {
            id: id.to_string(),
            name: format!("Activity {}", id),
            category: ActivityCategory::Adventure,
            location: coords.map(|(lat, lng)| GeoPoint { lat, lng }),
            location_name: String::new(),
            district: String::new(),
            duration_hours: 2.0,
            preferred_start: None,
        }
    }

    fn anchor(name: &str, lat: f64, lng: f64) -> GeoLocation {
        GeoLocation {
            lat,
            lng,
            name: name.to_string(),
        }
    }

    #[test]
    fn activities_group_around_nearest_anchor() {
        let anchors = vec![
            anchor("Paris", 48.8566, 2.3522),
            anchor("Nice", 43.7102, 7.2620),
        ];
        let activities = vec![
            activity("p1", Some((48.8600, 2.3400))),
            activity("n1", Some((43.7000, 7.2700))),
            activity("p2", Some((48.8500, 2.3600))),
        ];

        let mut rng = StdRng::seed_from_u64(0);
        let clusters = cluster_activities(&activities, &anchors, 15.0, &mut rng);

        assert_eq!(clusters.len(), 2);
        let paris = clusters
            .iter()
            .find(|c| c.anchor.as_ref().unwrap().name == "Paris")
            .unwrap();
        assert_eq!(paris.activities.len(), 2);
    }

    #[test]
    fn nearby_singleton_anchors_merge_into_one_cluster() {
        // Derived anchors are one per quantized point; sites a couple of
        // kilometers apart must still end up in the same cluster.
        let activities = vec![
            activity("p1", Some((48.8600, 2.3400))),
            activity("p2", Some((48.8500, 2.3600))),
            activity("n1", Some((43.7102, 7.2620))),
        ];

        let mut rng = StdRng::seed_from_u64(0);
        let clusters = cluster_activities(&activities, &[], 15.0, &mut rng);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].activities.len(), 2);
    }

    #[test]
    fn coordless_activities_form_their_own_pool() {
        let activities = vec![
            activity("geo", Some((48.8566, 2.3522))),
            activity("blind", None),
        ];

        let mut rng = StdRng::seed_from_u64(0);
        let clusters = cluster_activities(&activities, &[], 15.0, &mut rng);

        assert_eq!(clusters.len(), 2);
        assert!(clusters.last().unwrap().anchor.is_none());
    }

    #[test]
    fn proximity_order_visits_neighbors_consecutively() {
        // Three points on a line; starting from the west end the order must
        // follow the line instead of jumping back and forth.
        let activities = vec![
            activity("mid", Some((48.85, 3.0))),
            activity("east", Some((48.85, 4.0))),
            activity("west", Some((48.85, 2.0))),
        ];

        let ordered = order_by_proximity(activities, Some((48.85, 1.9)));
        let ids: Vec<&str> = ordered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["west", "mid", "east"]);
    }

    #[test]
    fn coordless_activities_keep_input_order_at_the_end() {
        let activities = vec![
            activity("blind1", None),
            activity("geo", Some((48.85, 2.0))),
            activity("blind2", None),
        ];

        let ordered = order_by_proximity(activities, None);
        let ids: Vec<&str> = ordered.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["geo", "blind1", "blind2"]);
    }
}
