//! # Great-Circle Distance
//!
//! Haversine distance on a spherical Earth. Accurate to roughly 0.5% against
//! the WGS-84 ellipsoid, which is far below the resolution anyone cares about
//! when walking to a bike dock.

use crate::Coordinate;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance in kilometres between two coordinates.
///
/// Always finite and non-negative for valid coordinates, zero for identical
/// points, and symmetric in its arguments.
///
/// # Example
/// ```
/// use cycle_finder_lib::{distance::distance_km, Coordinate};
///
/// let london = Coordinate { latitude: 51.5, longitude: -0.12 };
/// let paris = Coordinate { latitude: 48.85, longitude: 2.35 };
/// let km = distance_km(london, paris);
/// assert!((343.0..344.5).contains(&km));
/// ```
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h just outside [0, 1] near coincident or antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
