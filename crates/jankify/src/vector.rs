//! Checked vector primitives.
//!
//! glam already provides component arithmetic on [`Vec3`]; the helpers here
//! add the two operations that must refuse zero-length input instead of
//! silently producing NaN or a zero vector.

use glam::Vec3;

use crate::error::GeometryError;

/// Normalize `v`, failing on zero length.
pub fn normalize(v: Vec3) -> Result<Vec3, GeometryError> {
    let length = v.length();
    if length == 0.0 {
        return Err(GeometryError::DegenerateVector);
    }
    if !length.is_finite() {
        return Err(GeometryError::InvalidGeometry(format!(
            "cannot normalize non-finite vector {v:?}"
        )));
    }
    Ok(v / length)
}

/// Angle between `a` and `b` in `[0, pi]`.
pub fn angle_between(a: Vec3, b: Vec3) -> Result<f32, GeometryError> {
    let a = normalize(a)?;
    let b = normalize(b)?;
    // Rounding can push the dot product just past +/-1.
    Ok(a.dot(b).clamp(-1.0, 1.0).acos())
}
