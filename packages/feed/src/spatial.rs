//! Radius filtering around the map's view center.
//!
//! Distances use a flat-earth approximation: the Euclidean distance in
//! degrees, scaled by 111 km per degree. This overstates east-west
//! distances away from the equator, which is acceptable for a city-scale
//! radius.

use geo::Point;
use orbit_incident_models::Coordinate;

/// Kilometres per degree used by [`distance_km`].
pub const KM_PER_DEGREE: f64 = 111.0;

/// Default view radius in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 15.0;

/// Default view center (longitude, latitude).
pub const DEFAULT_CENTER: (f64, f64) = (85.1, 25.6);

/// The default view center as a point.
#[must_use]
pub fn default_center() -> Point<f64> {
    Point::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1)
}

/// Converts a stored coordinate to a map point (x = longitude).
#[must_use]
pub fn to_point(coordinate: Coordinate) -> Point<f64> {
    Point::new(coordinate.longitude, coordinate.latitude)
}

/// Approximate distance between two points in kilometres.
#[must_use]
pub fn distance_km(from: Point<f64>, to: Point<f64>) -> f64 {
    let delta = to - from;
    delta.x().hypot(delta.y()) * KM_PER_DEGREE
}

/// Whether `point` lies within `radius_km` of `center`. The boundary is
/// inclusive.
#[must_use]
pub fn within_radius(center: Point<f64>, point: Point<f64>, radius_km: f64) -> bool {
    distance_km(center, point) <= radius_km
}
