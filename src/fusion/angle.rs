//! Circular angle helpers
//!
//! All angles are in degrees on the half-open range (-180, 180].

use libm::fmodf;

/// Mathematical modulo: result has the sign of `modulus`, unlike `fmodf`
/// which keeps the sign of `value`
fn modulo(value: f32, modulus: f32) -> f32 {
    let remainder = fmodf(value, modulus);
    if remainder < 0.0 {
        let shifted = remainder + modulus;
        // A tiny negative remainder can round up to exactly `modulus`
        if shifted >= modulus { shifted - modulus } else { shifted }
    } else {
        remainder
    }
}

/// Wrap an angle into (-180, 180] in one step
///
/// In-range angles are returned as they are, so small values keep their
/// full precision. NaN stays NaN.
pub fn wrap_degrees(angle: f32) -> f32 {
    if angle > -180.0 && angle <= 180.0 {
        return angle;
    }
    180.0 - modulo(180.0 - angle, 360.0)
}

/// Signed shortest rotation from `from` to `to`, in (-180, 180]
///
/// Positive means `to` lies counter-clockwise of `from`. Exactly opposite
/// angles give +180.
pub fn angle_difference(from: f32, to: f32) -> f32 {
    wrap_degrees(to - from)
}
