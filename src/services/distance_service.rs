//! Distance and travel time estimation.
//!
//! The planner performs no network I/O, so travel times are inferred from
//! great-circle distance at an assumed average road speed.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate distance between two points using the Haversine formula.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let lat1_rad = from.0.to_radians();
    let lat2_rad = to.0.to_radians();
    let delta_lat = (to.0 - from.0).to_radians();
    let delta_lon = (to.1 - from.1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Estimated transit time in whole minutes at the given average speed.
pub fn travel_minutes(from: (f64, f64), to: (f64, f64), average_speed_kmh: f64) -> i64 {
    if average_speed_kmh <= 0.0 {
        return 0;
    }
    let distance_km = haversine_km(from, to);
    ((distance_km / average_speed_kmh) * 60.0).round() as i64
}
