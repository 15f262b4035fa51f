//! Yaw and vector helpers for the locomotion core.
//!
//! All angles are degrees, normalized to the half-open range [-180, 180).
//! The world is z-up; horizontal quantities ignore z.

pub type Vec3 = nalgebra::Vector3<f32>;

const EPS: f32 = 1e-6;

/// Length of the horizontal (x, y) part of a vector.
#[inline]
pub fn horizontal_speed(v: &Vec3) -> f32 {
    (v.x * v.x + v.y * v.y).sqrt()
}

/// Horizontal part of a vector with z zeroed.
#[inline]
pub fn horizontal(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, 0.0)
}

/// Wrap an angle into [-180, 180).
pub fn normalize_yaw(yaw: f32) -> f32 {
    let wrapped = yaw.rem_euclid(360.0);
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Signed shortest difference `a - b`, in [-180, 180).
#[inline]
pub fn yaw_delta(a: f32, b: f32) -> f32 {
    normalize_yaw(a - b)
}

/// Heading of a vector's horizontal part, in degrees.
///
/// A zero-length horizontal vector yields 0; call sites guard with their own
/// is-moving / has-input checks before trusting the result.
pub fn yaw_from_vector(v: &Vec3) -> f32 {
    if horizontal_speed(v) < EPS {
        return 0.0;
    }
    normalize_yaw(v.y.atan2(v.x).to_degrees())
}

/// Unit vector pointing along a yaw heading (degrees).
pub fn vector_from_yaw(yaw: f32) -> Vec3 {
    let rad = yaw.to_radians();
    Vec3::new(rad.cos(), rad.sin(), 0.0)
}

/// Right vector of a yaw heading (yaw + 90 degrees).
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    vector_from_yaw(yaw + 90.0)
}

/// Constant-rate yaw interpolation: step toward `target` at `rate` deg/s,
/// never overshooting. A non-positive rate snaps to the target.
pub fn interp_yaw_constant(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    if rate <= 0.0 {
        return normalize_yaw(target);
    }
    let delta = yaw_delta(target, current);
    let step = rate * dt;
    if delta.abs() <= step {
        normalize_yaw(target)
    } else {
        normalize_yaw(current + step.copysign(delta))
    }
}

/// Exponential-ease yaw interpolation: close a `dt * rate` fraction of the
/// remaining distance each frame. A non-positive rate snaps to the target.
pub fn interp_yaw_to(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    if rate <= 0.0 {
        return normalize_yaw(target);
    }
    let delta = yaw_delta(target, current);
    if delta.abs() < EPS {
        return normalize_yaw(target);
    }
    normalize_yaw(current + delta * (dt * rate).clamp(0.0, 1.0))
}

/// Exponential-ease scalar interpolation (non-angular).
pub fn interp_to(current: f32, target: f32, dt: f32, rate: f32) -> f32 {
    if rate <= 0.0 {
        return target;
    }
    current + (target - current) * (dt * rate).clamp(0.0, 1.0)
}

/// Remap `value` from `[in_min, in_max]` to `[out_min, out_max]`, clamped to
/// the output range.
pub fn map_range_clamped(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    if (in_max - in_min).abs() < EPS {
        return out_min;
    }
    let t = ((value - in_min) / (in_max - in_min)).clamp(0.0, 1.0);
    out_min + t * (out_max - out_min)
}
