//! FDTD stepping kernel benchmark: one full impulse response is the
//! per-iteration hot path of the engine worker loop.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pv_core::{EngineConfig, GridBoundaryType, GridCenteringType, GridResolution, Vec2};
use pv_acoustic::Grid;

fn test_config() -> EngineConfig {
    EngineConfig {
        grid_size_in_meters: Vec2::new(10.0, 10.0),
        grid_resolution: GridResolution::Hz275,
        grid_boundary_type: GridBoundaryType::Absorbing,
        grid_centering_type: GridCenteringType::Static,
        grid_world_offset: Vec2::ZERO,
    }
}

fn bench_step_impulse(c: &mut Criterion) {
    let config = test_config();
    let mut grid = Grid::new(&config);
    let listener = Vec2::new(5.0, 5.0);

    c.bench_function("grid_step_impulse_10x10_hz275", |b| {
        b.iter(|| {
            grid.step_impulse(black_box(listener));
        })
    });
}

criterion_group!(benches, bench_step_impulse);
criterion_main!(benches);
