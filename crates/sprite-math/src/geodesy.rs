/// Mean earth radius in meters, shared by the haversine distance/bearing solve and the
/// equirectangular small-displacement approximation so the two stay numerically
/// consistent with each other at short range.
pub(crate) const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic coordinate. Longitude/latitude are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Great-circle distance (haversine) and initial bearing from `a` to `b`.
///
/// For `a == b` the distance is `0.0` and the bearing is indeterminate; this function
/// returns `0.0` for the bearing in that case, but callers must not treat that as a
/// real direction.
pub fn distance_and_bearing_meters(a: LngLat, b: LngLat) -> (f64, f64) {
    if a.lng == b.lng && a.lat == b.lat {
        return (0.0, 0.0);
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_half_lat = (delta_lat / 2.0).sin();
    let sin_half_lng = (delta_lng / 2.0).sin();
    let h = sin_half_lat * sin_half_lat + lat1.cos() * lat2.cos() * sin_half_lng * sin_half_lng;
    let angular_distance = 2.0 * h.min(1.0).max(0.0).sqrt().asin();
    let distance_m = EARTH_RADIUS_M * angular_distance;

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();
    let bearing_deg = y.atan2(x).to_degrees();
    let bearing_deg = (bearing_deg + 360.0) % 360.0;

    (distance_m, bearing_deg)
}

/// Displaces `base` by `(east_m, north_m)` using the WGS84-radius equirectangular
/// approximation: valid for small displacements (sprite offsets, surface quad corners),
/// not for long-haul navigation.
pub fn apply_surface_displacement(base: LngLat, east_north_m: (f64, f64)) -> LngLat {
    let (east_m, north_m) = east_north_m;
    let lat_rad = base.lat.to_radians();

    let delta_lat_deg = (north_m / EARTH_RADIUS_M).to_degrees();

    // Guard the longitude scale near the poles where cos(lat) collapses toward zero.
    let cos_lat = lat_rad.cos().max(1e-6);
    let delta_lng_deg = (east_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();

    LngLat::new(base.lng + delta_lng_deg, base.lat + delta_lat_deg)
}
