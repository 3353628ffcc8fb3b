//! Per-callback mixing benchmark: `send_source` is the real-time hot path
//! the audio callback drives every buffer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pv_core::{DspConfig, Vec2};
use pv_dsp::{DspContext, EmissionInput};

fn bench_send_source(c: &mut Criterion) {
    let config = DspConfig::default();
    let mut ctx = DspContext::new(config).unwrap();
    let id = ctx.add_emitter().unwrap();
    ctx.set_listener_transform(Vec2::ZERO, Vec2::new(1.0, 0.0));
    ctx.update_emitter(id, Vec2::new(2.0, 0.0), Vec2::new(-1.0, 0.0));

    let params = EmissionInput {
        occlusion: 0.7,
        wet_gain: 0.6,
        rt60: 0.8,
        lowpass: 12_000.0,
        direction: Vec2::new(1.0, 0.0),
        source_directivity: Vec2::new(1.0, 0.0),
    };
    let input = vec![0.25f32; 1024 * 2];

    c.bench_function("dsp_send_source_1024_frames", |b| {
        b.iter(|| {
            ctx.send_source(id, black_box(params), black_box(&input), 1024);
            black_box(ctx.get_output());
        })
    });
}

criterion_group!(benches, bench_send_source);
criterion_main!(benches);
