//! Background-worker lifecycle for the acoustic engine: owns the Grid,
//! FreeGrid, GeometryManager, EmissionManager and Analyzer, and runs the
//! FDTD+Analyzer loop on a dedicated thread per `spec.md` §4.6 / §5.
//!
//! Grounded on `original_source/ProjectPlaneverb/src/Context/PvContext.cpp`'s
//! `BackgroundProcessor` loop, reformulated per `SPEC_FULL.md` §9: the
//! placement-new memory pool becomes a plain owning struct, the singleton
//! becomes a handle returned by `new`, and the listener position bridge is
//! an atomic-bit-cast `Vec2` rather than a raw struct read under no
//! synchronization at all, mirroring `rf-audio::engine::TransportPosition`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;

use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use pv_core::{Aabb, ConfigError, ConfigResult, EngineConfig, Vec2, Vec3};

use crate::analyzer::{Analyzer, AnalyzerResult};
use crate::cell::Cell;
use crate::emission::EmissionManager;
use crate::free_grid::FreeGrid;
use crate::geometry::GeometryManager;
use crate::grid::Grid;

/// Single-writer/single-reader world position, stored as two bit-cast
/// `AtomicU64`s so the worker never blocks reading the host's latest
/// listener position. Relaxed ordering is sufficient: the worker only needs
/// to observe *some* recent value each iteration, not a specific
/// happens-before relationship with `x`/`y` individually.
#[derive(Default)]
struct AtomicVec2 {
    x: AtomicU64,
    y: AtomicU64,
}

impl AtomicVec2 {
    fn new(v: Vec2) -> Self {
        Self {
            x: AtomicU64::new(v.x.to_bits()),
            y: AtomicU64::new(v.y.to_bits()),
        }
    }

    fn load(&self) -> Vec2 {
        Vec2::new(
            f64::from_bits(self.x.load(Ordering::Relaxed)),
            f64::from_bits(self.y.load(Ordering::Relaxed)),
        )
    }

    fn store(&self, v: Vec2) {
        self.x.store(v.x.to_bits(), Ordering::Relaxed);
        self.y.store(v.y.to_bits(), Ordering::Relaxed);
    }
}

/// Owns the whole acoustic subsystem and its background worker thread.
///
/// `grid` and `analyzer` are shared with the worker behind `RwLock`: the
/// worker takes the write side once per iteration (a full FDTD step / full
/// analyzer pass), the host takes the read side for occasional debug and
/// result queries. `geometry` is the pending-change queue's mutex, shared
/// the same way between host mutation calls and the worker's per-iteration
/// drain. `emission` is host-only (the worker never reads emitter
/// positions; it analyzes every grid cell and the host resolves an
/// emitter's result by its own position lookup), kept behind a `Mutex`
/// purely so the handle can be shared through `Arc` at the FFI boundary.
pub struct EngineContext {
    config: EngineConfig,
    grid: Arc<RwLock<Grid>>,
    free_grid: Arc<FreeGrid>,
    geometry: Arc<Mutex<GeometryManager>>,
    emission: Mutex<EmissionManager>,
    analyzer: Arc<RwLock<Analyzer>>,
    listener: Arc<AtomicVec2>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl EngineContext {
    /// Validates `config`, builds every subsystem, and starts the
    /// background worker. Fails synchronously (before the thread starts)
    /// on an invalid config, matching `spec.md`'s "invalid configurations
    /// fail synchronously at construction".
    pub fn new(config: EngineConfig) -> ConfigResult<Self> {
        config.validate()?;

        let grid = Grid::new(&config);
        if grid.nx() <= 1 || grid.ny() <= 1 {
            return Err(ConfigError::InvalidConfig(
                "grid_size_in_meters is too small for the configured resolution (W or H rounds to 0)".into(),
            ));
        }
        let (nx, ny) = (grid.nx(), grid.ny());

        let free_grid = FreeGrid::new(&config);
        let geometry = GeometryManager::new(config.grid_centering_type);
        let emission = EmissionManager::new();
        let analyzer = Analyzer::new(nx, ny);

        let grid = Arc::new(RwLock::new(grid));
        let free_grid = Arc::new(free_grid);
        let geometry = Arc::new(Mutex::new(geometry));
        let analyzer = Arc::new(RwLock::new(analyzer));
        let listener = Arc::new(AtomicVec2::new(Vec2::ZERO));
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let grid = Arc::clone(&grid);
            let free_grid = Arc::clone(&free_grid);
            let geometry = Arc::clone(&geometry);
            let analyzer = Arc::clone(&analyzer);
            let listener = Arc::clone(&listener);
            let running = Arc::clone(&running);

            std::thread::Builder::new()
                .name("pv-engine-worker".into())
                .spawn(move || {
                    info!("pv-engine-worker started");
                    while running.load(Ordering::Acquire) {
                        let listener_pos = listener.load();

                        grid.write().step_impulse(listener_pos);
                        {
                            let grid_read = grid.read();
                            analyzer.write().analyze(&grid_read, &free_grid, listener_pos);
                        }
                        {
                            let mut geo = geometry.lock();
                            let mut grid_write = grid.write();
                            geo.push_changes(&mut grid_write, listener_pos);
                        }
                    }
                    info!("pv-engine-worker stopped");
                })
                .map_err(|_| ConfigError::NotEnoughMemory)?
        };

        Ok(Self {
            config,
            grid,
            free_grid,
            geometry,
            emission: Mutex::new(emission),
            analyzer,
            listener,
            running,
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_listener_position(&self, position: Vec3) {
        self.listener.store(position.to_plane());
    }

    pub fn listener_position(&self) -> Vec2 {
        self.listener.load()
    }

    pub fn add_emitter(&self, position: Vec3) -> u32 {
        self.emission.lock().add_emitter(position.to_plane())
    }

    pub fn update_emitter(&self, id: u32, position: Vec3) {
        self.emission.lock().update_emitter(id, position.to_plane());
    }

    pub fn remove_emitter(&self, id: u32) {
        self.emission.lock().remove_emitter(id);
    }

    pub fn get_emitter(&self, id: u32) -> Option<Vec2> {
        self.emission.lock().get_emitter(id)
    }

    pub fn add_geometry(&self, aabb: Aabb) -> u32 {
        self.geometry.lock().add(aabb)
    }

    pub fn update_geometry(&self, id: u32, aabb: Aabb) {
        self.geometry.lock().update(id, aabb);
    }

    pub fn remove_geometry(&self, id: u32) {
        self.geometry.lock().remove(id);
    }

    /// Resolves an emitter's current acoustic parameters. Returns the
    /// sentinel result (`occlusion = -1`) for an unknown emitter id or one
    /// whose position currently falls outside the grid footprint, per
    /// `spec.md` §7.
    pub fn get_output(&self, emitter_id: u32) -> AnalyzerResult {
        let Some(position) = self.get_emitter(emitter_id) else {
            warn!("get_output: unknown emitter id {emitter_id}");
            return AnalyzerResult::sentinel();
        };
        let grid = self.grid.read();
        self.analyzer
            .read()
            .get_result(&grid, position)
            .unwrap_or_else(AnalyzerResult::sentinel)
    }

    /// Debug accessor: a copy of the pressure/velocity impulse response at
    /// the cell nearest `world_pos`, or `None` if that position is outside
    /// the grid footprint.
    pub fn get_impulse_response(&self, world_pos: Vec3) -> Option<Vec<Cell>> {
        let grid = self.grid.read();
        let (x, y, in_bounds) = grid.nearest_cell(world_pos.to_plane());
        if !in_bounds {
            return None;
        }
        Some(grid.response(x, y).clone())
    }

    /// Signals the worker to stop and joins it. Safe to call more than
    /// once; subsequent calls are no-ops.
    pub fn exit(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.worker.take() {
            debug!("joining pv-engine-worker");
            let _ = handle.join();
        }
    }
}

impl Drop for EngineContext {
    fn drop(&mut self) {
        self.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_core::{GridBoundaryType, GridCenteringType, GridResolution};

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
    fn invalid_config_rejected() {
        let mut config = test_config();
        config.grid_size_in_meters = Vec2::new(0.0, 10.0);
        assert!(EngineContext::new(config).is_err());
    }

    #[test]
    fn unknown_emitter_returns_sentinel() {
        let ctx = EngineContext::new(test_config()).unwrap();
        let result = ctx.get_output(999);
        assert_eq!(result.occlusion, -1.0);
    }

    #[test]
    fn emitter_cycle_recycles_id() {
        let ctx = EngineContext::new(test_config()).unwrap();
        let id = ctx.add_emitter(Vec3::new(1.0, 0.0, 1.0));
        ctx.remove_emitter(id);
        let id2 = ctx.add_emitter(Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(id, id2);
    }

    #[test]
    fn worker_runs_and_exits_cleanly() {
        let mut ctx = EngineContext::new(test_config()).unwrap();
        ctx.set_listener_position(Vec3::new(5.0, 0.0, 5.0));
        std::thread::sleep(std::time::Duration::from_millis(50));
        ctx.exit();
    }
}
