//! Pre-computed Gaussian excitation pulse.

use pv_core::Sample;

/// A one-shot Gaussian pressure excitation, sampled once at construction
/// and re-added to the listener cell at every timestep of an impulse
/// response.
#[derive(Debug, Clone)]
pub struct GridPulse {
    samples: Vec<Sample>,
}

impl GridPulse {
    /// `sigma = 1 / (pi * f_max / 2)`; the pulse peaks at `t = 2*sigma` and
    /// is sampled at `sampling_rate` for `num_samples` points.
    pub fn new(f_max: f64, sampling_rate: f64, num_samples: usize) -> Self {
        let sigma = 1.0 / (std::f64::consts::PI * f_max / 2.0);
        let delay = 2.0 * sigma;
        let dt = 1.0 / sampling_rate;

        let samples = (0..num_samples)
            .map(|i| {
                let t = i as f64 * dt;
                let arg = (t - delay) / sigma;
                (-arg * arg).exp()
            })
            .collect();

        Self { samples }
    }

    #[inline]
    pub fn sample(&self, t: usize) -> Sample {
        self.samples.get(t).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_peaks_near_delay() {
        let pulse = GridPulse::new(500.0, 48_000.0, 200);
        let peak_index = (0..pulse.len())
            .max_by(|&a, &b| pulse.sample(a).partial_cmp(&pulse.sample(b)).unwrap())
            .unwrap();
        assert!(pulse.sample(peak_index) > 0.99);
    }

    #[test]
    fn pulse_decays_at_edges() {
        let pulse = GridPulse::new(500.0, 48_000.0, 400);
        assert!(pulse.sample(0) < 0.2);
        assert!(pulse.sample(pulse.len() - 1) < 0.2);
    }
}
