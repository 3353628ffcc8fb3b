//! `DspContext`: the real-time renderer. Mixes every emitter's submitted
//! audio into a dry stereo bus and three wet stereo buses per `spec.md`
//! §4.8/§4.9.
//!
//! Grounded on `original_source/PlaneverbDSP/src/PvDSPContext.cpp`'s
//! `SubmitSource`/`GetOutput`. Unlike `pv_acoustic::EngineContext`, the
//! renderer runs no background thread of its own — every method takes
//! `&mut self` and the host (typically the audio callback) is responsible
//! for not calling it concurrently from two threads, matching the
//! reference implementation, which carries no internal locking either.

use pv_core::{
    ConfigResult, DspConfig, SourceDirectivityPattern, Vec2, MAX_AUDIBLE_FREQ, MIN_AUDIBLE_FREQ,
    MIN_DRY_GAIN,
};

use crate::bus_gains::{gain_a, gain_b, gain_c};
use crate::directivity::directivity_gain;
use crate::output_bank::OutputBank;
use crate::panning::equal_power_pan;
use crate::state::{EmissionInput, EmissionTable};

/// `GetOutput`'s result: a snapshot of each bus's just-filled interleaved
/// stereo buffer, borrowed from the context's output banks.
pub struct DspOutput<'a> {
    pub dry: &'a [f32],
    pub bus_a: &'a [f32],
    pub bus_b: &'a [f32],
    pub bus_c: &'a [f32],
}

pub struct DspContext {
    config: DspConfig,
    emissions: EmissionTable,
    listener_position: Vec2,
    listener_forward: Vec2,
    dry: OutputBank,
    bus_a: OutputBank,
    bus_b: OutputBank,
    bus_c: OutputBank,
    /// Set by `send_source`, cleared by `process_output`; mirrors
    /// `ProcessOutput`'s "false if no data yet" return value.
    dirty: bool,
}

impl DspContext {
    pub fn new(config: DspConfig) -> ConfigResult<Self> {
        config.validate()?;
        let sampling_rate = config.sampling_rate as f64;
        Ok(Self {
            emissions: EmissionTable::new(config.max_emitters, sampling_rate),
            listener_position: Vec2::ZERO,
            listener_forward: Vec2::new(1.0, 0.0),
            dry: OutputBank::new(config.max_callback_length),
            bus_a: OutputBank::new(config.max_callback_length),
            bus_b: OutputBank::new(config.max_callback_length),
            bus_c: OutputBank::new(config.max_callback_length),
            dirty: false,
            config,
        })
    }

    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    pub fn set_listener_transform(&mut self, position: Vec2, forward: Vec2) {
        self.listener_position = position;
        self.listener_forward = forward;
    }

    /// Allocates a new emitter slot. Returns `None` when the table is
    /// already at `max_emitters` ("too many emitters", per `spec.md` §4.9).
    pub fn add_emitter(&mut self) -> Option<u32> {
        self.emissions.add()
    }

    pub fn remove_emitter(&mut self, id: u32) {
        self.emissions.remove(id);
    }

    /// Updates an emitter's world transform. Lazily materializes the slot
    /// if the host addresses an id it hasn't explicitly added (matching
    /// the source's map-based `insert_or_assign` semantics).
    pub fn update_emitter(&mut self, id: u32, position: Vec2, forward: Vec2) {
        if let Some(state) = self.emissions.get_or_insert_mut(id) {
            state.target.position = position;
            state.target.forward = forward;
        } else {
            log::warn!("update_emitter: id {id} is out of range for the emitter table");
        }
    }

    pub fn set_emitter_directivity_pattern(&mut self, id: u32, pattern: SourceDirectivityPattern) {
        if let Some(state) = self.emissions.get_or_insert_mut(id) {
            state.directivity_pattern = pattern;
        } else {
            log::warn!("set_emitter_directivity_pattern: id {id} is out of range for the emitter table");
        }
    }

    /// Mixes one emitter's interleaved stereo `input` (`num_frames` frames,
    /// `2 * num_frames` samples) into the dry and wet output banks,
    /// per `spec.md` §4.8's ten-step per-callback flow.
    pub fn send_source(&mut self, id: u32, params: EmissionInput, input: &[f32], num_frames: usize) {
        if params.lowpass < MIN_AUDIBLE_FREQ
            || params.lowpass > MAX_AUDIBLE_FREQ
            || params.occlusion <= 0.0
            || params.direction.is_zero()
        {
            log::debug!("send_source: dropping out-of-range input for emitter {id}");
            return;
        }
        let num_frames = num_frames.min(self.config.max_callback_length);
        debug_assert_eq!(input.len(), num_frames * 2);

        let listener_position = self.listener_position;
        let listener_forward = self.listener_forward;
        let wet_gain_ratio = self.config.wet_gain_ratio;
        let lerp_factor = 1.0 / (num_frames as f64 * self.config.dsp_smoothing_factor);

        let Some(state) = self.emissions.get_or_insert_mut(id) else {
            log::warn!("send_source: id {id} is out of range for the emitter table");
            return;
        };

        state.target.occlusion = params.occlusion;
        state.target.wet_gain = params.wet_gain;
        state.target.rt60 = params.rt60;
        state.target.lowpass = params.lowpass;
        state.target.direction = params.direction;
        state.target.source_directivity = params.source_directivity;

        let target_gain_a = gain_a(state.target.rt60, state.target.wet_gain);
        let target_gain_b = gain_b(state.target.rt60, state.target.wet_gain);
        let target_gain_c = gain_c(state.target.rt60, state.target.wet_gain);
        let (target_pan_l, target_pan_r) = if self.config.use_spatialization {
            equal_power_pan(listener_forward, state.target.direction)
        } else {
            (1.0, 1.0)
        };

        let distance = listener_position.distance_to(state.target.position).max(1.0);
        let distance_attenuation = 1.0 / distance;
        let directivity = directivity_gain(
            state.directivity_pattern,
            state.target.source_directivity,
            state.target.forward,
        );
        let target_dry_gain = state.target.occlusion.max(MIN_DRY_GAIN) * distance_attenuation * directivity;
        let target_lowpass = state.target.lowpass;

        self.dirty = true;
        let current = &mut state.current;

        let mut mono = vec![0.0f64; num_frames];
        for (frame, m) in mono.iter_mut().enumerate() {
            *m = 0.5 * (input[frame * 2] as f64 + input[frame * 2 + 1] as f64);
        }
        current.lpf.process(&mut mono, target_lowpass, lerp_factor);

        let dry_write = self.dry.write_buffer();
        let a_write = self.bus_a.write_buffer();
        let b_write = self.bus_b.write_buffer();
        let c_write = self.bus_c.write_buffer();

        for frame in 0..num_frames {
            current.gain_a += (target_gain_a - current.gain_a) * lerp_factor;
            current.gain_b += (target_gain_b - current.gain_b) * lerp_factor;
            current.gain_c += (target_gain_c - current.gain_c) * lerp_factor;
            current.pan_l += (target_pan_l - current.pan_l) * lerp_factor;
            current.pan_r += (target_pan_r - current.pan_r) * lerp_factor;
            current.dry_gain += (target_dry_gain - current.dry_gain) * lerp_factor;

            let sample = mono[frame];
            a_write[frame * 2] += (sample * current.gain_a * wet_gain_ratio) as f32;
            a_write[frame * 2 + 1] += (sample * current.gain_a * wet_gain_ratio) as f32;
            b_write[frame * 2] += (sample * current.gain_b * wet_gain_ratio) as f32;
            b_write[frame * 2 + 1] += (sample * current.gain_b * wet_gain_ratio) as f32;
            c_write[frame * 2] += (sample * current.gain_c * wet_gain_ratio) as f32;
            c_write[frame * 2 + 1] += (sample * current.gain_c * wet_gain_ratio) as f32;

            let dry_sample = sample * current.dry_gain;
            dry_write[frame * 2] += (dry_sample * current.pan_l) as f32;
            dry_write[frame * 2 + 1] += (dry_sample * current.pan_r) as f32;
        }
    }

    /// Flips every output bank so this callback's mix becomes readable via
    /// [`Self::dry_buffer`]/[`Self::bus_a_buffer`]/etc., stable until the
    /// next call. Returns `false` (and still flips, to a silent bank) when
    /// no emitter submitted audio since the previous call.
    pub fn process_output(&mut self) -> bool {
        self.dry.swap_and_zero();
        self.bus_a.swap_and_zero();
        self.bus_b.swap_and_zero();
        self.bus_c.swap_and_zero();
        std::mem::take(&mut self.dirty)
    }

    pub fn dry_buffer(&self) -> &[f32] {
        self.dry.filled_bank()
    }

    pub fn bus_a_buffer(&self) -> &[f32] {
        self.bus_a.filled_bank()
    }

    pub fn bus_b_buffer(&self) -> &[f32] {
        self.bus_b.filled_bank()
    }

    pub fn bus_c_buffer(&self) -> &[f32] {
        self.bus_c.filled_bank()
    }

    /// Convenience wrapper bundling [`Self::process_output`]'s four
    /// buffers into one borrow, for callers that don't need the
    /// "has new data" flag.
    pub fn get_output(&mut self) -> DspOutput<'_> {
        self.process_output();
        DspOutput {
            dry: self.dry.filled_bank(),
            bus_a: self.bus_a.filled_bank(),
            bus_b: self.bus_b.filled_bank(),
            bus_c: self.bus_c.filled_bank(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_input(num_frames: usize) -> Vec<f32> {
        vec![0.0; num_frames * 2]
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = DspConfig::default();
        config.max_emitters = 0;
        assert!(DspContext::new(config).is_err());
    }

    #[test]
    fn too_many_emitters_returns_none() {
        let mut config = DspConfig::default();
        config.max_emitters = 1;
        let mut ctx = DspContext::new(config).unwrap();
        assert!(ctx.add_emitter().is_some());
        assert!(ctx.add_emitter().is_none());
    }

    #[test]
    fn process_output_reports_no_data_when_nothing_was_sent() {
        let config = DspConfig::default();
        let mut ctx = DspContext::new(config).unwrap();
        assert!(!ctx.process_output());
    }

    #[test]
    fn out_of_range_input_is_dropped_without_mixing() {
        let config = DspConfig::default();
        let mut ctx = DspContext::new(config).unwrap();
        let id = ctx.add_emitter().unwrap();
        let params = EmissionInput {
            occlusion: -1.0,
            wet_gain: 1.0,
            rt60: 1.0,
            lowpass: 10_000.0,
            direction: Vec2::new(1.0, 0.0),
            source_directivity: Vec2::ZERO,
        };
        ctx.send_source(id, params, &silent_input(64), 64);
        let output = ctx.get_output();
        assert!(output.dry.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn centered_loud_source_produces_dry_output() {
        let config = DspConfig::default();
        let mut ctx = DspContext::new(config).unwrap();
        let id = ctx.add_emitter().unwrap();
        ctx.set_listener_transform(Vec2::ZERO, Vec2::new(1.0, 0.0));
        ctx.update_emitter(id, Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));

        let params = EmissionInput {
            occlusion: 1.0,
            wet_gain: 0.0,
            rt60: 0.0,
            lowpass: 20_000.0,
            direction: Vec2::new(1.0, 0.0),
            source_directivity: Vec2::ZERO,
        };
        let input = vec![1.0f32; 64 * 2];
        ctx.send_source(id, params, &input, 64);
        let output = ctx.get_output();
        assert!(output.dry.iter().any(|&s| s != 0.0), "expected a loud centered source to produce nonzero dry output");
    }

    #[test]
    fn get_output_swaps_to_a_freshly_zeroed_bank() {
        let config = DspConfig::default();
        let mut ctx = DspContext::new(config).unwrap();
        let id = ctx.add_emitter().unwrap();
        ctx.update_emitter(id, Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0));
        let params = EmissionInput {
            occlusion: 1.0,
            wet_gain: 0.0,
            rt60: 0.0,
            lowpass: 20_000.0,
            direction: Vec2::new(1.0, 0.0),
            source_directivity: Vec2::ZERO,
        };
        let input = vec![1.0f32; 64 * 2];
        ctx.send_source(id, params, &input, 64);
        let _ = ctx.get_output();
        let second = ctx.get_output();
        assert!(second.dry.iter().all(|&s| s == 0.0), "a callback with no further send_source calls should flip to a silent bank");
    }
}
