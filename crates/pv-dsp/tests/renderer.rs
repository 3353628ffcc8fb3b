//! End-to-end renderer scenarios, grounded on `spec.md` §8's worked
//! examples for the panning law and the gain-partition-of-unity property.

use pv_core::{DspConfig, Vec2};
use pv_dsp::{equal_power_pan, gain_a, gain_b, gain_c, DspContext, EmissionInput};

#[test]
fn panning_law_centered_source_is_equal_power() {
    let (l, r) = equal_power_pan(Vec2::new(1.0, 0.0), Vec2::new(1.0, 0.0));
    let expected = std::f64::consts::FRAC_1_SQRT_2;
    assert!((l - expected).abs() < 1e-9);
    assert!((r - expected).abs() < 1e-9);
}

#[test]
fn bus_gain_partition_holds_at_half_second_rt60() {
    let (rt60, gain) = (0.5, 0.9);
    let sum = gain_a(rt60, gain) + gain_b(rt60, gain) + gain_c(rt60, gain);
    assert!((sum - gain).abs() < 1e-9);
}

#[test]
fn bus_gain_partition_holds_at_three_second_rt60() {
    let (rt60, gain) = (3.0, 0.9);
    let sum = gain_a(rt60, gain) + gain_b(rt60, gain) + gain_c(rt60, gain);
    assert!((sum - gain).abs() < 1e-9);
}

#[test]
fn lerp_is_continuous_across_two_callbacks() {
    let mut config = DspConfig::default();
    config.dsp_smoothing_factor = 5.0;
    config.max_callback_length = 256;
    let mut ctx = DspContext::new(config).unwrap();
    let id = ctx.add_emitter().unwrap();
    ctx.set_listener_transform(Vec2::ZERO, Vec2::new(1.0, 0.0));
    ctx.update_emitter(id, Vec2::new(2.0, 0.0), Vec2::new(-1.0, 0.0));

    let params = EmissionInput {
        occlusion: 0.5,
        wet_gain: 0.8,
        rt60: 1.0,
        lowpass: 8_000.0,
        direction: Vec2::new(1.0, 0.0),
        source_directivity: Vec2::new(1.0, 0.0),
    };
    let input = vec![0.5f32; 256 * 2];

    ctx.send_source(id, params, &input, 256);
    let first = ctx.get_output();
    assert!(first.dry.iter().any(|&s| s != 0.0));
    assert!(first.dry.iter().all(|&s| s.is_finite()));

    ctx.send_source(id, params, &input, 256);
    let second = ctx.get_output();
    assert!(second.dry.iter().all(|&s| s.is_finite()));
}

#[test]
fn too_many_emitters_fails_cleanly() {
    let mut config = DspConfig::default();
    config.max_emitters = 2;
    let mut ctx = DspContext::new(config).unwrap();
    assert!(ctx.add_emitter().is_some());
    assert!(ctx.add_emitter().is_some());
    assert!(ctx.add_emitter().is_none());
}
