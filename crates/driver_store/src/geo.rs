//! Great-circle distance on a spherical earth.

/// Mean earth radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// haversin(θ) = sin²(θ/2)
#[inline]
fn hsin(theta: f64) -> f64 {
    let half = (theta / 2.0).sin();
    half * half
}

/// Returns the distance in meters between two points given in degrees, using
/// the haversine formula.
///
/// `h` is clamped to `[0, 1]` before `sqrt`/`asin` so rounding near the
/// antipode cannot produce `NaN`.
///
/// ```rust
/// use driver_store::geo::distance;
///
/// let one_degree = distance(0.0, 0.0, 0.0, 1.0);
/// assert!((one_degree - 111_319.0).abs() < 1_200.0);
/// ```
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let la1 = lat1.to_radians();
    let lo1 = lon1.to_radians();
    let la2 = lat2.to_radians();
    let lo2 = lon2.to_radians();

    let h = hsin(la2 - la1) + la1.cos() * la2.cos() * hsin(lo2 - lo1);
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}
