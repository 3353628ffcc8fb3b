//! Per-cell impulse-response analysis: onset delay, obstruction gain,
//! source radiation direction, lowpass cutoff, wet gain, RT60, and the
//! delay-ascending neighbour walk that yields the listener-arrival
//! direction.
//!
//! Two-pass structure confirmed against
//! `original_source/ProjectPlaneverb/src/DSP/Analyzer.cpp`: every cell's
//! onset/occlusion/direction/lowpass/wet/RT60 is computed first, then every
//! cell's listener direction is computed in a second pass, since the
//! neighbour walk reads other cells' already-written delay and occlusion.

use pv_core::{
    Vec2, AUDIBLE_THRESHOLD_GAIN, DELAY_CLOSE_THRESHOLD, DISTANCE_GAIN_THRESHOLD,
    DRY_DIRECTION_ANALYSIS_LENGTH_S, DRY_GAIN_ANALYSIS_LENGTH_S, LOS_THRESHOLD_FACTOR,
    SCHROEDER_OFFSET_S, SPEED_OF_SOUND, WET_GAIN_ANALYSIS_LENGTH_S,
};

use crate::free_grid::FreeGrid;
use crate::grid::Grid;

const POSSIBLE_NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerResult {
    pub occlusion: f64,
    pub wet_gain: f64,
    pub rt60: f64,
    pub lowpass_intensity: f64,
    pub listener_direction: Vec2,
    pub source_direction: Vec2,
}

impl AnalyzerResult {
    /// The "no data" result: an out-of-range or onset-less cell gets this
    /// back, matching the `occlusion = -1, direction = (0,0)` sentinel the
    /// external API maps to "fall back to dry, unoccluded".
    pub const fn sentinel() -> Self {
        Self {
            occlusion: -1.0,
            wet_gain: 0.0,
            rt60: f64::NAN,
            lowpass_intensity: 0.0,
            listener_direction: Vec2::ZERO,
            source_direction: Vec2::ZERO,
        }
    }
}

impl Default for AnalyzerResult {
    fn default() -> Self {
        Self::sentinel()
    }
}

pub struct Analyzer {
    results: Vec<AnalyzerResult>,
    delay_samples: Vec<f64>,
    nx: usize,
    ny: usize,
}

impl Analyzer {
    pub fn new(nx: usize, ny: usize) -> Self {
        Self {
            results: vec![AnalyzerResult::sentinel(); nx * ny],
            delay_samples: vec![f64::INFINITY; nx * ny],
            nx,
            ny,
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.nx + x
    }

    pub fn analyze(&mut self, grid: &Grid, free_grid: &FreeGrid, listener: Vec2) {
        let rate = grid.sampling_rate();
        let n_resp = grid.response_length();

        for y in 0..self.ny {
            for x in 0..self.nx {
                let idx = self.index(x, y);
                let response = grid.response(x, y);
                let cell_world = grid.cell_world_position(x, y);

                let Some(onset) = response
                    .iter()
                    .position(|c| c.p.abs() > AUDIBLE_THRESHOLD_GAIN)
                else {
                    self.delay_samples[idx] = f64::INFINITY;
                    self.results[idx] = AnalyzerResult::sentinel();
                    continue;
                };
                self.delay_samples[idx] = onset as f64;

                let result = self.encode_response(response, onset, rate, n_resp, free_grid, listener, cell_world);
                self.results[idx] = result;
            }
        }

        for y in 0..self.ny {
            for x in 0..self.nx {
                let direction = self.walk_to_listener(grid, x, y, listener);
                let idx = self.index(x, y);
                self.results[idx].listener_direction = direction;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_response(
        &self,
        response: &[crate::cell::Cell],
        onset: usize,
        rate: f64,
        n_resp: usize,
        free_grid: &FreeGrid,
        listener: Vec2,
        cell_world: Vec2,
    ) -> AnalyzerResult {
        let n_dir = (DRY_DIRECTION_ANALYSIS_LENGTH_S * rate).ceil() as usize;
        let n_dry = (DRY_GAIN_ANALYSIS_LENGTH_S * rate).ceil() as usize;
        let n_wet = (WET_GAIN_ANALYSIS_LENGTH_S * rate).ceil() as usize;

        let mut flux = Vec2::ZERO;
        let mut e_dry = 0.0;
        for i in 0..n_dry {
            let Some(cell) = response.get(onset + i) else {
                break;
            };
            if i < n_dir {
                flux = flux + Vec2::new(cell.p * cell.vx, cell.p * cell.vy);
            }
            e_dry += cell.p * cell.p;
        }

        let e_free_r = free_grid.e_free_per_r(listener, cell_world);
        let occlusion = (e_dry / e_free_r).sqrt();

        let flux_mag = flux.length();
        let norm = -1.0 / flux_mag.max(1.0);
        let source_direction = flux * norm;

        let r = 1.0 / occlusion.max(0.001);
        let lowpass_intensity = -147.0 + 18390.0 / (1.0 + (r / 12.0).powf(0.8));

        let mut e_wet = 0.0;
        for i in 0..n_wet {
            if let Some(cell) = response.get(onset + n_dry + i) {
                e_wet += cell.p * cell.p;
            }
        }
        let wet_gain = (e_wet / free_grid.e_at_one_meter()).sqrt();

        let rt60 = self.rt60(response, onset + n_dry, n_resp, rate);

        AnalyzerResult {
            occlusion,
            wet_gain,
            rt60,
            lowpass_intensity,
            listener_direction: Vec2::ZERO,
            source_direction,
        }
    }

    /// Backward Schroeder integration, closed-form least-squares slope.
    fn rt60(&self, response: &[crate::cell::Cell], start: usize, n_resp: usize, rate: f64) -> f64 {
        let schroeder_samples = (SCHROEDER_OFFSET_S * rate).ceil() as usize;
        let end = n_resp.saturating_sub(schroeder_samples);
        if end <= start {
            return f64::NAN;
        }
        let n = end - start;

        let mut ys = vec![0.0; n];
        let mut edc: f64 = response[end..n_resp].iter().map(|c| c.p * c.p).sum();
        for i in (start..end).rev() {
            edc += response[i].p * response[i].p;
            let edc_db = 10.0 * edc.max(f64::MIN_POSITIVE).log10();
            ys[i - start] = edc_db;
        }

        let n_f = n as f64;
        let xmean = (n_f - 1.0) / 2.0;
        let ymean: f64 = ys.iter().sum::<f64>() / n_f;
        let sxx = n_f * (n_f * n_f - 1.0) / 12.0;
        let mut sxy = 0.0;
        for (x, &y) in ys.iter().enumerate() {
            sxy += (x as f64 - xmean) * (y - ymean);
        }
        let slope = sxy / sxx;
        -60.0 / (slope * rate)
    }

    /// Delay-ascending neighbour walk with a line-of-sight break, yielding
    /// the unit vector from the listener to the final cell reached.
    fn walk_to_listener(&self, grid: &Grid, start_x: usize, start_y: usize, listener: Vec2) -> Vec2 {
        let idx0 = self.index(start_x, start_y);
        if !self.delay_samples[idx0].is_finite() {
            return Vec2::ZERO;
        }

        let mut cx = start_x as i64;
        let mut cy = start_y as i64;
        let mut delay = self.delay_samples[idx0];
        let mut loudness = self.results[idx0].occlusion;
        let threshold_los = LOS_THRESHOLD_FACTOR * SPEED_OF_SOUND / grid.f_max();

        while delay > DELAY_CLOSE_THRESHOLD && loudness < DISTANCE_GAIN_THRESHOLD {
            let mut best: Option<(i64, i64, f64)> = None;
            for (dx, dy) in POSSIBLE_NEIGHBORS {
                let (nx_i, ny_i) = (cx + dx, cy + dy);
                if nx_i < 0 || ny_i < 0 || nx_i as usize >= self.nx || ny_i as usize >= self.ny {
                    continue;
                }
                let nidx = self.index(nx_i as usize, ny_i as usize);
                let next_delay = self.delay_samples[nidx];
                let next_occlusion = self.results[nidx].occlusion;
                if next_occlusion <= 0.0 || !next_delay.is_finite() || next_delay >= delay {
                    continue;
                }
                if best.map(|(_, _, best_delay)| next_delay < best_delay).unwrap_or(true) {
                    best = Some((nx_i, ny_i, next_delay));
                }
            }

            let Some((bx, by, next_delay)) = best else {
                break;
            };
            cx = bx;
            cy = by;
            delay = next_delay;
            loudness = self.results[self.index(bx as usize, by as usize)].occlusion;

            let geodesic = SPEED_OF_SOUND * delay / grid.sampling_rate();
            let cell_world = grid.cell_world_position(cx as usize, cy as usize);
            let euclidean = listener.distance_to(cell_world);
            if (geodesic - euclidean).abs() < threshold_los {
                break;
            }
        }

        let final_world = grid.cell_world_position(cx as usize, cy as usize);
        (final_world - listener).normalized()
    }

    pub fn get_result(&self, grid: &Grid, emitter_world: Vec2) -> Option<AnalyzerResult> {
        let (x, y, in_bounds) = grid.nearest_cell(emitter_world);
        if !in_bounds {
            return None;
        }
        Some(self.results[self.index(x, y)])
    }
}
