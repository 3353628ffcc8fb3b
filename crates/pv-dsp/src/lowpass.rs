//! Second-order Butterworth lowpass, direct-form-II-transposed, with
//! per-callback linear coefficient interpolation toward a target cutoff.
//!
//! Grounded on `original_source/PlaneverbDSP/src/DSP/Lowpass.h`'s
//! `LowpassFilter`, reformulated per `SPEC_FULL.md` §4.7 as a plain struct
//! (no raw `float*` channel stride arithmetic) matching
//! `rf_dsp::biquad::BiquadTDF2`'s state shape (`y1`/`y2` delays kept across
//! calls, coefficients recomputed from a cutoff setter).

use pv_core::Sample;

#[derive(Debug, Clone, Copy)]
struct Coeffs {
    x: Sample,
    y1: Sample,
    y2: Sample,
}

impl Coeffs {
    /// `T = 2*pi*fc / rate`; `Y = 1 / (1 + sqrt(2)*T + T^2)`.
    fn from_cutoff(cutoff_hz: f64, sampling_rate: f64) -> Self {
        let t = 2.0 * std::f64::consts::PI * cutoff_hz / sampling_rate;
        let y = 1.0 / (1.0 + std::f64::consts::SQRT_2 * t + t * t);
        Self {
            x: t * t * y,
            y1: (2.0 + std::f64::consts::SQRT_2 * t) * y,
            y2: -y,
        }
    }

    fn lerp(self, target: Self, factor: f64) -> Self {
        Self {
            x: self.x + (target.x - self.x) * factor,
            y1: self.y1 + (target.y1 - self.y1) * factor,
            y2: self.y2 + (target.y2 - self.y2) * factor,
        }
    }
}

/// One channel's lowpass state: the two output delays plus the "current"
/// coefficient triple, which this callback's processing lerps toward a
/// target and leaves as the new starting point for the next callback.
#[derive(Debug, Clone, Copy)]
pub struct LowpassFilter {
    sampling_rate: f64,
    cutoff: f64,
    coeffs: Coeffs,
    y_delay_1: Sample,
    y_delay_2: Sample,
}

impl LowpassFilter {
    pub fn new(sampling_rate: f64, initial_cutoff: f64) -> Self {
        Self {
            sampling_rate,
            cutoff: initial_cutoff,
            coeffs: Coeffs::from_cutoff(initial_cutoff, sampling_rate),
            y_delay_1: 0.0,
            y_delay_2: 0.0,
        }
    }

    #[inline]
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Resets the coefficient triple to exactly match `cutoff_hz`, without
    /// touching the `y` delay state. Used to seed a fresh emitter's
    /// "current" filter at its very first target cutoff.
    pub fn set_cutoff(&mut self, cutoff_hz: f64) {
        self.cutoff = cutoff_hz;
        self.coeffs = Coeffs::from_cutoff(cutoff_hz, self.sampling_rate);
    }

    /// Filters `buffer` in place, lerping the coefficient triple from its
    /// current value toward `target_cutoff`'s coefficients over the
    /// buffer's length using `lerp_factor` per sample. Leaves the final
    /// interpolated coefficients as the new "current" state.
    pub fn process(&mut self, buffer: &mut [Sample], target_cutoff: f64, lerp_factor: f64) {
        let target = Coeffs::from_cutoff(target_cutoff, self.sampling_rate);
        let mut current = self.coeffs;

        for sample in buffer.iter_mut() {
            let y = current.x * *sample + current.y1 * self.y_delay_1 + current.y2 * self.y_delay_2;
            self.y_delay_2 = self.y_delay_1;
            self.y_delay_1 = y;
            *sample = y;
            current = current.lerp(target, lerp_factor);
        }

        self.coeffs = current;
        self.cutoff = target_cutoff;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_converges_to_target_at_smoothing_one() {
        let mut filter = LowpassFilter::new(48_000.0, 20_000.0);
        let target = Coeffs::from_cutoff(1_000.0, 48_000.0);

        let mut buffer = vec![0.0; 512];
        let lerp_factor = 1.0 / (512.0 * 1.0);
        filter.process(&mut buffer, 1_000.0, lerp_factor);

        assert!((filter.coeffs.x - target.x).abs() < 1e-9);
        assert!((filter.coeffs.y1 - target.y1).abs() < 1e-9);
        assert!((filter.coeffs.y2 - target.y2).abs() < 1e-9);
    }

    #[test]
    fn partial_smoothing_is_a_convex_combination() {
        let start = Coeffs::from_cutoff(20_000.0, 48_000.0);
        let mut filter = LowpassFilter::new(48_000.0, 20_000.0);
        let target = Coeffs::from_cutoff(1_000.0, 48_000.0);

        let num_frames = 512.0;
        let smoothing = 5.0;
        let lerp_factor = 1.0 / (num_frames * smoothing);
        let mut buffer = vec![0.0; num_frames as usize];
        filter.process(&mut buffer, 1_000.0, lerp_factor);

        // After one full callback of per-sample lerping, the result is
        // `start + (target - start) * (1 - (1 - lerp_factor)^num_frames)`,
        // strictly between `start` and `target` (never overshooting).
        assert!(filter.coeffs.x > start.x.min(target.x) && filter.coeffs.x < start.x.max(target.x));
    }

    #[test]
    fn silence_in_silence_out() {
        let mut filter = LowpassFilter::new(48_000.0, 5_000.0);
        let mut buffer = vec![0.0; 64];
        filter.process(&mut buffer, 5_000.0, 1.0);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
