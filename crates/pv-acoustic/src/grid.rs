//! The 2D FDTD grid: staggered pressure/velocity stepping, absorbing
//! boundary, AABB obstacle rasterization, and listener-centred coordinate
//! transforms.
//!
//! Grounded on `original_source/ProjectPlaneverb/src/FDTD/Grid.cpp`'s grid
//! parameter and rasterization formulas, reformulated per `SPEC_FULL.md` §9
//! as an owned-by-value struct (no placement-new arena) holding a flat
//! `Vec<Cell>` and a `Vec<ImpulseResponse>` rather than one big byte pool.

use log::debug;
use pv_core::{
    Aabb, EngineConfig, GridCenteringType, Sample, Vec2, POINTS_PER_WAVELENGTH, SPEED_OF_SOUND,
};

use crate::cell::{Cell, ImpulseResponse};
use crate::pulse::GridPulse;

/// Flattened cell grid index convention: `x` is fastest-varying, `y` steps
/// by `nx` (the number of cells along x, `W + 1`).
#[inline]
fn flat_index(x: usize, y: usize, nx: usize) -> usize {
    y * nx + x
}

pub struct Grid {
    cells: Vec<Cell>,
    responses: Vec<ImpulseResponse>,
    pulse: GridPulse,

    nx: usize,
    ny: usize,
    dx: f64,
    dt: f64,
    sampling_rate: f64,
    response_length: usize,

    world_size: Vec2,
    world_offset: Vec2,
    centering: GridCenteringType,
    last_listener: Vec2,

    f_max: f64,
}

impl Grid {
    pub fn new(config: &EngineConfig) -> Self {
        let f_max = config.grid_resolution.as_f64();
        let (dx, dt, sampling_rate) = Self::calculate_grid_parameters(f_max);

        let w = (config.grid_size_in_meters.x / dx).floor() as usize;
        let h = (config.grid_size_in_meters.y / dx).floor() as usize;
        let nx = w + 1;
        let ny = h + 1;

        let response_length_s =
            2f64.sqrt() * (config.grid_size_in_meters.x / 2.0) / SPEED_OF_SOUND + 0.25;
        let response_length = (sampling_rate * response_length_s).ceil() as usize;

        let mut cells = vec![Cell::air(); nx * ny];
        for y in 0..ny {
            for x in 0..nx {
                apply_border_mask(&mut cells[flat_index(x, y, nx)], x, y, nx, ny);
            }
        }

        let pulse = GridPulse::new(f_max, sampling_rate, response_length);
        let responses = vec![Vec::new(); nx * ny];

        debug!(
            "grid constructed: {nx}x{ny} cells, dx={dx:.6}, dt={dt:.8}, response_length={response_length}"
        );

        Self {
            cells,
            responses,
            pulse,
            nx,
            ny,
            dx,
            dt,
            sampling_rate,
            response_length,
            world_size: config.grid_size_in_meters,
            world_offset: config.grid_world_offset,
            centering: config.grid_centering_type,
            last_listener: Vec2::ZERO,
            f_max,
        }
    }

    /// `dx = c / (f_max * PPW)`; `dt = dx / (1.5 * c)`; `rate = 1 / dt`.
    fn calculate_grid_parameters(f_max: f64) -> (f64, f64, f64) {
        let dx = SPEED_OF_SOUND / (f_max * POINTS_PER_WAVELENGTH);
        let dt = dx / (1.5 * SPEED_OF_SOUND);
        let sampling_rate = 1.0 / dt;
        (dx, dt, sampling_rate)
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[inline]
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    #[inline]
    pub fn response_length(&self) -> usize {
        self.response_length
    }

    #[inline]
    pub fn f_max(&self) -> f64 {
        self.f_max
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[flat_index(x, y, self.nx)]
    }

    #[inline]
    pub fn response(&self, x: usize, y: usize) -> &ImpulseResponse {
        &self.responses[flat_index(x, y, self.nx)]
    }

    /// World-space position of cell `(x, y)`'s centre, using the grid's
    /// last-observed listener position for dynamic centring.
    pub fn cell_world_position(&self, x: usize, y: usize) -> Vec2 {
        self.grid_to_world(Vec2::new(x as f64, y as f64))
    }

    pub fn world_to_grid(&self, world: Vec2) -> Vec2 {
        let half_dim = self.world_size * 0.5;
        let shifted = match self.centering {
            GridCenteringType::Static => world + half_dim - self.world_offset,
            GridCenteringType::Dynamic => {
                world - self.last_listener + half_dim - self.world_offset
            }
        };
        shifted * (1.0 / self.dx)
    }

    pub fn grid_to_world(&self, grid: Vec2) -> Vec2 {
        let half_dim = self.world_size * 0.5;
        let scaled = grid * self.dx;
        match self.centering {
            GridCenteringType::Static => scaled - half_dim + self.world_offset,
            GridCenteringType::Dynamic => scaled + self.last_listener - half_dim + self.world_offset,
        }
    }

    /// Returns the grid index nearest to `world`, clamped to the grid, and
    /// whether `world` actually fell inside the grid's footprint.
    pub fn nearest_cell(&self, world: Vec2) -> (usize, usize, bool) {
        let g = self.world_to_grid(world);
        let in_bounds =
            g.x >= 0.0 && g.y >= 0.0 && (g.x as usize) < self.nx && (g.y as usize) < self.ny;
        let cx = g.x.round().clamp(0.0, (self.nx - 1) as f64) as usize;
        let cy = g.y.round().clamp(0.0, (self.ny - 1) as f64) as usize;
        (cx, cy, in_bounds)
    }

    fn aabb_bounds(&self, aabb: &Aabb) -> (i64, i64, i64, i64) {
        let min = self.world_to_grid(aabb.min());
        let max = self.world_to_grid(aabb.max());
        (
            min.x.floor() as i64,
            min.y.floor() as i64,
            max.x.floor() as i64,
            max.y.floor() as i64,
        )
    }

    /// Rasterizes `aabb` into the grid: every in-bounds cell in
    /// `[start_x, end_x) x [start_y, end_y)` becomes an obstacle surface.
    pub fn add_aabb(&mut self, aabb: &Aabb) {
        let (start_x, start_y, end_x, end_y) = self.aabb_bounds(aabb);
        for y in start_y.max(0)..end_y.min(self.ny as i64) {
            for x in start_x.max(0)..end_x.min(self.nx as i64) {
                let idx = flat_index(x as usize, y as usize, self.nx);
                let cell = &mut self.cells[idx];
                cell.b = false;
                cell.bx = false;
                cell.r = aabb.absorption;
            }
        }
    }

    /// Undoes `add_aabb` over the same footprint, restoring free-space air
    /// cells and re-applying the padded-border mask across that footprint.
    pub fn remove_aabb(&mut self, aabb: &Aabb) {
        let (start_x, start_y, end_x, end_y) = self.aabb_bounds(aabb);
        for y in start_y.max(0)..end_y.min(self.ny as i64) {
            for x in start_x.max(0)..end_x.min(self.nx as i64) {
                let (ux, uy) = (x as usize, y as usize);
                let idx = flat_index(ux, uy, self.nx);
                let cell = &mut self.cells[idx];
                cell.b = true;
                cell.bx = true;
                cell.r = 0.0;
                apply_border_mask(cell, ux, uy, self.nx, self.ny);
            }
        }
    }

    /// Resets the entire interior to free space and reasserts the border
    /// mask everywhere.
    pub fn clear_aabbs(&mut self) {
        let (nx, ny) = (self.nx, self.ny);
        for y in 0..ny {
            for x in 0..nx {
                let idx = flat_index(x, y, nx);
                let cell = &mut self.cells[idx];
                cell.b = true;
                cell.bx = true;
                cell.r = 0.0;
                apply_border_mask(cell, x, y, nx, ny);
            }
        }
    }

    /// Runs one full impulse response: zeroes dynamic state, steps the FDTD
    /// stencil `response_length` times, recording a `Cell` snapshot of every
    /// cell at each timestep and exciting the listener's cell with the
    /// precomputed pulse.
    pub fn step_impulse(&mut self, listener: Vec2) {
        self.last_listener = listener;

        for cell in &mut self.cells {
            cell.reset_dynamics();
        }
        for response in &mut self.responses {
            response.clear();
            response.reserve(self.response_length);
        }

        let (listener_x, listener_y, in_bounds) = self.nearest_cell(listener);
        if !in_bounds {
            debug!("listener position outside grid footprint; pulse has no excitation point");
        }

        let c_courant = SPEED_OF_SOUND * self.dt / self.dx;

        for t in 0..self.response_length {
            self.update_pressure(c_courant);
            self.update_velocity_y(c_courant);
            self.update_velocity_x(c_courant);
            self.apply_absorbing_boundary();
            self.record(t);

            let idx = flat_index(listener_x, listener_y, self.nx);
            self.cells[idx].p += self.pulse.sample(t);
        }
    }

    fn update_pressure(&mut self, c: f64) {
        let (nx, ny) = (self.nx, self.ny);
        for y in 0..ny {
            for x in 0..nx {
                let idx = flat_index(x, y, nx);
                if x + 1 >= nx || y + 1 >= ny {
                    self.cells[idx].p = 0.0;
                    continue;
                }
                let beta = self.cells[idx].b as u8 as f64;
                let vy_here = self.cells[idx].vy;
                let vy_above = self.cells[flat_index(x, y + 1, nx)].vy;
                let vx_here = self.cells[idx].vx;
                let vx_right = self.cells[flat_index(x + 1, y, nx)].vx;
                let p = self.cells[idx].p;
                self.cells[idx].p =
                    beta * (p - c * ((vy_above - vy_here) + (vx_right - vx_here)));
            }
        }
    }

    fn update_velocity_y(&mut self, c: f64) {
        let (nx, ny) = (self.nx, self.ny);
        for y in 1..ny {
            for x in 0..nx {
                let idx = flat_index(x, y, nx);
                let idx_above = flat_index(x, y - 1, nx);

                let beta = self.cells[idx].b as u8 as f64;
                let beta_n = self.cells[idx_above].b as u8 as f64;
                let r = self.cells[idx].r;
                let r_n = self.cells[idx_above].r;
                let y_coef = (1.0 - r) / (1.0 + r);
                let y_n_coef = (1.0 - r_n) / (1.0 + r_n);

                let p = self.cells[idx].p;
                let p_above = self.cells[idx_above].p;
                let vy = self.cells[idx].vy;

                let air_term = beta * beta_n * (vy - c * (p - p_above));
                let boundary_term =
                    (beta_n - beta) * (beta * y_n_coef + beta_n * y_coef) * (p_above * beta_n + p * beta);

                self.cells[idx].vy = air_term + boundary_term;
            }
        }
    }

    fn update_velocity_x(&mut self, c: f64) {
        let (nx, ny) = (self.nx, self.ny);
        for y in 0..ny {
            for x in 1..nx {
                let idx = flat_index(x, y, nx);
                let idx_left = flat_index(x - 1, y, nx);

                let beta = self.cells[idx].b as u8 as f64;
                let beta_n = self.cells[idx_left].b as u8 as f64;
                let r = self.cells[idx].r;
                let r_n = self.cells[idx_left].r;
                let y_coef = (1.0 - r) / (1.0 + r);
                let y_n_coef = (1.0 - r_n) / (1.0 + r_n);

                let p = self.cells[idx].p;
                let p_left = self.cells[idx_left].p;
                let vx = self.cells[idx].vx;

                let air_term = beta * beta_n * (vx - c * (p - p_left));
                let boundary_term =
                    (beta_n - beta) * (beta * y_n_coef + beta_n * y_coef) * (p_left * beta_n + p * beta);

                self.cells[idx].vx = air_term + boundary_term;
            }
        }
    }

    /// First-order Mur-style absorbing termination: the outer edge's
    /// velocity is set equal to (plus or minus) the adjacent interior
    /// pressure cell.
    fn apply_absorbing_boundary(&mut self) {
        let (nx, ny) = (self.nx, self.ny);
        for x in 0..nx {
            let top = flat_index(x, 0, nx);
            self.cells[top].vy = -self.cells[top].p;
            let bottom = flat_index(x, ny - 1, nx);
            let bottom_inner = flat_index(x, ny - 2, nx);
            self.cells[bottom].vy = self.cells[bottom_inner].p;
        }
        for y in 0..ny {
            let left = flat_index(0, y, nx);
            self.cells[left].vx = -self.cells[left].p;
            let right = flat_index(nx - 1, y, nx);
            let right_inner = flat_index(nx - 2, y, nx);
            self.cells[right].vx = self.cells[right_inner].p;
        }
    }

    fn record(&mut self, t: usize) {
        debug_assert_eq!(self.cells.len(), self.responses.len());
        for (response, cell) in self.responses.iter_mut().zip(self.cells.iter()) {
            debug_assert_eq!(response.len(), t);
            response.push(*cell);
        }
    }
}

/// Applies the padded-border boundary mask convention: the last row and
/// last column are fully closed (`b = bx = false`); the first column keeps
/// `b = true` but closes `bx`; everywhere else is open air.
fn apply_border_mask(cell: &mut Cell, x: usize, y: usize, nx: usize, ny: usize) {
    if x == nx - 1 || y == ny - 1 {
        cell.b = false;
        cell.bx = false;
    } else if x == 0 {
        cell.b = true;
        cell.bx = false;
    } else {
        cell.b = true;
        cell.bx = true;
    }
    cell.r = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_core::{GridBoundaryType, GridResolution};

    fn test_config() -> EngineConfig {
        EngineConfig {
            grid_size_in_meters: Vec2::new(10.0, 10.0),
            grid_resolution: GridResolution::Hz275,
            grid_boundary_type: GridBoundaryType::Absorbing,
            grid_centering_type: GridCenteringType::Static,
            grid_world_offset: Vec2::ZERO,
        }
    }

    #[test]
    fn border_mask_after_construction() {
        let grid = Grid::new(&test_config());
        let (nx, ny) = (grid.nx(), grid.ny());
        for y in 0..ny {
            for x in 0..nx {
                let cell = grid.cell(x, y);
                if x == nx - 1 || y == ny - 1 {
                    assert!(!cell.b && !cell.bx);
                } else if x == 0 {
                    assert!(cell.b && !cell.bx);
                } else {
                    assert!(cell.b && cell.bx);
                }
                assert_eq!(cell.r, 0.0);
            }
        }
    }

    #[test]
    fn aabb_round_trip_restores_border_mask() {
        let mut grid = Grid::new(&test_config());
        let aabb = Aabb::new(Vec2::new(5.0, 5.0), 1.0, 1.0, 0.8);
        grid.add_aabb(&aabb);
        grid.remove_aabb(&aabb);

        let (nx, ny) = (grid.nx(), grid.ny());
        for y in 0..ny {
            for x in 0..nx {
                let cell = grid.cell(x, y);
                assert_eq!(cell.r, 0.0);
                if x != nx - 1 && y != ny - 1 && x != 0 {
                    assert!(cell.b && cell.bx);
                }
            }
        }
    }

    #[test]
    fn add_aabb_marks_interior_as_obstacle() {
        let mut grid = Grid::new(&test_config());
        let aabb = Aabb::new(Vec2::new(5.0, 5.0), 1.0, 1.0, 0.8);
        grid.add_aabb(&aabb);

        let center_grid = grid.world_to_grid(Vec2::new(5.0, 5.0));
        let cx = center_grid.x as usize;
        let cy = center_grid.y as usize;
        let cell = grid.cell(cx, cy);
        assert!(!cell.b);
        assert_eq!(cell.r, 0.8);
    }

    #[test]
    fn energy_is_bounded_with_no_obstacles() {
        let mut grid = Grid::new(&test_config());
        grid.step_impulse(Vec2::new(5.0, 5.0));

        let n = grid.response_length();
        let tail_start = n - n / 4;
        let mut early_energy = 0.0;
        let mut late_energy = 0.0;
        for y in 0..grid.ny() {
            for x in 0..grid.nx() {
                let response = grid.response(x, y);
                for (i, cell) in response.iter().enumerate() {
                    if i < n / 4 {
                        early_energy += cell.p * cell.p;
                    } else if i >= tail_start {
                        late_energy += cell.p * cell.p;
                    }
                }
            }
        }
        assert!(late_energy <= early_energy + 1e-6);
    }
}
