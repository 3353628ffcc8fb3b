//! One-time free-field reference energy, used by the Analyzer to normalize
//! observed energy into an obstruction/wet gain independent of raw pulse
//! amplitude.

use pv_core::{EngineConfig, Vec2, DRY_GAIN_ANALYSIS_LENGTH_S, SPEED_OF_SOUND};

use crate::grid::Grid;

pub struct FreeGrid {
    e_free: f64,
}

impl FreeGrid {
    /// Builds a scratch grid of the same resolution and scene size as the
    /// real engine grid, runs one impulse response with the source at the
    /// grid's world origin, and measures the reference energy 1 metre away.
    pub fn new(config: &EngineConfig) -> Self {
        let mut scratch = Grid::new(config);
        let origin = Vec2::ZERO;
        scratch.step_impulse(origin);

        let measure_point = Vec2::new(1.0, 0.0);
        let (mx, my, _) = scratch.nearest_cell(measure_point);
        let (ox, oy, _) = scratch.nearest_cell(origin);

        let grid_distance =
            (((mx as i64 - ox as i64).pow(2) + (my as i64 - oy as i64).pow(2)) as f64).sqrt();
        let r = grid_distance * scratch.dx();

        let window_s = DRY_GAIN_ANALYSIS_LENGTH_S + 1.0 / SPEED_OF_SOUND;
        let num_samples = (window_s * scratch.sampling_rate()).ceil() as usize;

        let response = scratch.response(mx, my);
        let energy: f64 = response
            .iter()
            .take(num_samples)
            .map(|cell| cell.p * cell.p)
            .sum();

        Self { e_free: r * energy }
    }

    /// Free-field energy at 1 metre, applying inverse-distance (2D) energy
    /// decay out to `listener`/`emitter`'s actual separation (floored at
    /// 1 metre by the caller).
    pub fn e_free_per_r(&self, listener: Vec2, emitter: Vec2) -> f64 {
        let distance = listener.distance_to(emitter).max(1.0);
        self.e_free / distance
    }

    pub fn e_at_one_meter(&self) -> f64 {
        self.e_free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_core::{GridBoundaryType, GridCenteringType, GridResolution};

    #[test]
    fn free_field_energy_is_positive() {
        let config = EngineConfig {
            grid_size_in_meters: Vec2::new(10.0, 10.0),
            grid_resolution: GridResolution::Hz275,
            grid_boundary_type: GridBoundaryType::Absorbing,
            grid_centering_type: GridCenteringType::Static,
            grid_world_offset: Vec2::ZERO,
        };
        let free_grid = FreeGrid::new(&config);
        assert!(free_grid.e_at_one_meter() > 0.0);
    }
}
