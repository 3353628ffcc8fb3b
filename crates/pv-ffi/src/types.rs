//! `#[repr(C)]` mirrors of the types that cross the FFI boundary.
//!
//! Grounded on the opaque-handle redesign note in `spec.md` §9 and the
//! `#[repr(C)]` struct style `rf-bridge`'s `*_ffi.rs` modules use for their
//! plain-data parameter structs.

use pv_core::{
    Aabb, EngineConfig, GridBoundaryType, GridCenteringType, GridResolution,
    SourceDirectivityPattern, Vec2, Vec3,
};
use pv_dsp::EmissionInput;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvVec2 {
    pub x: f64,
    pub y: f64,
}

impl From<PvVec2> for Vec2 {
    fn from(v: PvVec2) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<Vec2> for PvVec2 {
    fn from(v: Vec2) -> Self {
        PvVec2 { x: v.x, y: v.y }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvVec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<PvVec3> for Vec3 {
    fn from(v: PvVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvAabb {
    pub center: PvVec2,
    pub width: f64,
    pub height: f64,
    pub absorption: f64,
}

impl From<PvAabb> for Aabb {
    fn from(a: PvAabb) -> Self {
        Aabb::new(a.center.into(), a.width, a.height, a.absorption)
    }
}

/// `gridResolution` as a raw `u32`; only 275/375/500/750 are accepted (see
/// [`try_grid_resolution`]).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvEngineConfig {
    pub grid_size_in_meters: PvVec2,
    pub grid_resolution: u32,
    pub grid_centering_type: PvGridCenteringType,
    pub grid_world_offset: PvVec2,
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvGridCenteringType {
    Static = 0,
    Dynamic = 1,
}

impl From<PvGridCenteringType> for GridCenteringType {
    fn from(t: PvGridCenteringType) -> Self {
        match t {
            PvGridCenteringType::Static => GridCenteringType::Static,
            PvGridCenteringType::Dynamic => GridCenteringType::Dynamic,
        }
    }
}

pub fn try_grid_resolution(raw: u32) -> Option<GridResolution> {
    match raw {
        275 => Some(GridResolution::Hz275),
        375 => Some(GridResolution::Hz375),
        500 => Some(GridResolution::Hz500),
        750 => Some(GridResolution::Hz750),
        _ => None,
    }
}

pub fn try_engine_config(raw: &PvEngineConfig) -> Option<EngineConfig> {
    Some(EngineConfig {
        grid_size_in_meters: raw.grid_size_in_meters.into(),
        grid_resolution: try_grid_resolution(raw.grid_resolution)?,
        grid_boundary_type: GridBoundaryType::Absorbing,
        grid_centering_type: raw.grid_centering_type.into(),
        grid_world_offset: raw.grid_world_offset.into(),
    })
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvDspConfig {
    pub max_callback_length: u32,
    pub sampling_rate: u32,
    pub dsp_smoothing_factor: f64,
    pub use_spatialization: u8,
    pub wet_gain_ratio: f64,
    pub max_emitters: u32,
}

impl From<PvDspConfig> for pv_core::DspConfig {
    fn from(raw: PvDspConfig) -> Self {
        pv_core::DspConfig {
            max_callback_length: raw.max_callback_length as usize,
            sampling_rate: raw.sampling_rate,
            dsp_smoothing_factor: raw.dsp_smoothing_factor,
            use_spatialization: raw.use_spatialization != 0,
            wet_gain_ratio: raw.wet_gain_ratio,
            max_emitters: raw.max_emitters as usize,
        }
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvDirectivityPattern {
    Omni = 0,
    Cardioid = 1,
}

impl From<PvDirectivityPattern> for SourceDirectivityPattern {
    fn from(p: PvDirectivityPattern) -> Self {
        match p {
            PvDirectivityPattern::Omni => SourceDirectivityPattern::Omni,
            PvDirectivityPattern::Cardioid => SourceDirectivityPattern::Cardioid,
        }
    }
}

/// Mirrors `pv_acoustic::AnalyzerResult`, the Engine API's `GetOutput`
/// return type. `occlusion = -1` is the "no data" sentinel; test with
/// [`pv_is_output_valid`](crate::engine::pv_is_output_valid).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvAcousticResult {
    pub occlusion: f64,
    pub wet_gain: f64,
    pub rt60: f64,
    pub lowpass_intensity: f64,
    pub listener_direction: PvVec2,
    pub source_direction: PvVec2,
}

impl From<pv_acoustic::AnalyzerResult> for PvAcousticResult {
    fn from(r: pv_acoustic::AnalyzerResult) -> Self {
        PvAcousticResult {
            occlusion: r.occlusion,
            wet_gain: r.wet_gain,
            rt60: r.rt60,
            lowpass_intensity: r.lowpass_intensity,
            listener_direction: r.listener_direction.into(),
            source_direction: r.source_direction.into(),
        }
    }
}

/// Mirrors `pv_acoustic::Cell`'s three analyzer-relevant fields, for
/// `GetImpulseResponse`'s debug samples.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvImpulseSample {
    pub p: f64,
    pub vx: f64,
    pub vy: f64,
}

/// `SendSource`'s input parameter block.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PvEmissionInput {
    pub obstruction_gain: f64,
    pub wet_gain: f64,
    pub rt60: f64,
    pub lowpass: f64,
    pub direction: PvVec2,
    pub source_directivity: PvVec2,
}

impl From<PvEmissionInput> for EmissionInput {
    fn from(raw: PvEmissionInput) -> Self {
        EmissionInput {
            occlusion: raw.obstruction_gain,
            wet_gain: raw.wet_gain,
            rt60: raw.rt60,
            lowpass: raw.lowpass,
            direction: raw.direction.into(),
            source_directivity: raw.source_directivity.into(),
        }
    }
}

/// Error codes returned by `Init`/`ChangeSettings`; 0 is success.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PvError {
    Ok = 0,
    InvalidConfig = 1,
    NotEnoughMemory = 2,
}

impl From<pv_core::ConfigError> for PvError {
    fn from(e: pv_core::ConfigError) -> Self {
        match e {
            pv_core::ConfigError::InvalidConfig(_) => PvError::InvalidConfig,
            pv_core::ConfigError::NotEnoughMemory => PvError::NotEnoughMemory,
        }
    }
}

pub const INVALID_EMISSION_ID: u32 = u32::MAX;
