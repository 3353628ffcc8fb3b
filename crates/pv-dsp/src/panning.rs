//! Equal-power stereo panning from a listener forward vector and a
//! direction vector (listener-to-source, in the grid's XZ plane).
//!
//! Grounded on `original_source/PlaneverbDSP/src/PvDSPContext.cpp`'s
//! panning block, confirmed against `spec.md` §8's worked example
//! (`fwd = (1,0)`, `direction = (1,0)` gives `L = R = 1/sqrt(2)`).

use pv_core::{Vec2, INV_SQRT_2};

/// Returns `(left, right)` equal-power pan gains.
pub fn equal_power_pan(listener_forward: Vec2, direction: Vec2) -> (f64, f64) {
    let phi_listener = listener_forward.y.atan2(listener_forward.x);
    let phi = direction.y.atan2(direction.x);
    let theta = (phi_listener - phi) * 0.5;
    let (sin_t, cos_t) = theta.sin_cos();
    let left = (cos_t - sin_t) * INV_SQRT_2;
    let right = (cos_t + sin_t) * INV_SQRT_2;
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_source_is_equal_power_center() {
        let (l, r) = equal_power_pan(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
        assert!((l - INV_SQRT_2).abs() < 1e-9);
        assert!((r - INV_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn hard_left_and_hard_right_are_complementary() {
        let (l_left, r_left) = equal_power_pan(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        let (l_right, r_right) = equal_power_pan(Vec2::new(1.0, 0.0), Vec2::new(0.0, -1.0));
        assert!((l_left - r_right).abs() < 1e-9);
        assert!((r_left - l_right).abs() < 1e-9);
    }
}
