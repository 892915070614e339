//! Great-circle geometry between events and stations.

use crate::waveform::{Event, Station};

/// WGS-84 mean earth radius in km.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two lat/lon points, in km.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Source-to-station distance in km.
#[must_use]
pub fn distance_km(event: &Event, station: &Station) -> f64 {
    haversine_km(
        event.latitude,
        event.longitude,
        station.latitude,
        station.longitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude() {
        // One degree of latitude is ~111.19 km on the mean sphere.
        let d = haversine_km(34.0, -106.0, 35.0, -106.0);
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn zero_distance_for_colocated_points() {
        let d = haversine_km(34.946, -106.457, 34.946, -106.457);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn symmetric() {
        let ab = haversine_km(34.0, -106.0, 36.5, -103.25);
        let ba = haversine_km(36.5, -103.25, 34.0, -106.0);
        assert!((ab - ba).abs() < 1e-9);
    }
}
