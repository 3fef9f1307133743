//! Rough conversions between meters and degrees, for maps whose coordinates are longitude and
//! latitude. Good enough to size road widths; not good enough for surveying.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters spanned by one degree of latitude, assuming a spherical earth.
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

pub fn meters_per_degree_lat() -> f64 {
    METERS_PER_DEGREE_LAT
}

/// Meters spanned by one degree of longitude at some latitude. Shrinks towards the poles, but
/// never reaches zero.
pub fn meters_per_degree_lon(latitude: f64) -> f64 {
    let lat = latitude.clamp(-89.9, 89.9).to_radians();
    METERS_PER_DEGREE_LAT * lat.cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longitude_shrinks_with_latitude() {
        let equator = meters_per_degree_lon(0.0);
        assert!((equator - METERS_PER_DEGREE_LAT).abs() < 1e-6);
        assert!((meters_per_degree_lon(60.0) - equator / 2.0).abs() < 1e-6);
        assert!(meters_per_degree_lon(90.0) > 0.0);
        assert!((111_000.0..111_400.0).contains(&meters_per_degree_lat()));
    }
}
