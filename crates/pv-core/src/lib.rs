//! pv-core: shared math, physical constants, configuration and error types
//! for the Planeverb acoustic simulation and DSP crates.

mod constants;
mod error;
mod math;

pub use constants::*;
pub use error::*;
pub use math::*;

/// Sample type used throughout the acoustic simulation. The FDTD grid and
/// analyzer work in `f64` for stability over long impulse responses; the
/// DSP renderer narrows to `f32` at the audio-callback boundary.
pub type Sample = f64;

/// Grid resolution, expressed as the maximum faithfully represented
/// frequency in Hz. Only the four values the original shipped with are
/// accepted; anything else is rejected by [`EngineConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum GridResolution {
    Hz275 = 275,
    Hz375 = 375,
    Hz500 = 500,
    Hz750 = 750,
}

impl GridResolution {
    #[inline]
    pub fn as_f64(self) -> f64 {
        self as u32 as f64
    }
}

/// Grid boundary condition. Absorbing is the only supported value; kept as
/// an enum (rather than a bare constant) so the config surface matches the
/// source's and leaves room to reject anything else explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GridBoundaryType {
    Absorbing,
}

impl Default for GridBoundaryType {
    fn default() -> Self {
        Self::Absorbing
    }
}

/// How the grid follows the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GridCenteringType {
    /// Grid origin is fixed in world space; obstacle changes re-rasterize
    /// only the changed AABBs.
    Static,
    /// Grid re-centres on the listener; a full re-rasterization is
    /// triggered whenever the listener moves far enough.
    Dynamic,
}

/// Source directivity pattern used by the DSP renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceDirectivityPattern {
    Omni,
    Cardioid,
}

/// Engine-side configuration, validated once at construction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub grid_size_in_meters: Vec2,
    pub grid_resolution: GridResolution,
    pub grid_boundary_type: GridBoundaryType,
    pub grid_centering_type: GridCenteringType,
    pub grid_world_offset: Vec2,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size_in_meters.x <= 0.0 || self.grid_size_in_meters.y <= 0.0 {
            return Err(ConfigError::InvalidConfig(
                "grid_size_in_meters must be positive in both axes".into(),
            ));
        }
        Ok(())
    }
}

/// DSP-side configuration, validated once at construction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DspConfig {
    pub max_callback_length: usize,
    pub sampling_rate: u32,
    pub dsp_smoothing_factor: f64,
    pub use_spatialization: bool,
    pub wet_gain_ratio: f64,
    pub max_emitters: usize,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            max_callback_length: 1024,
            sampling_rate: 48_000,
            dsp_smoothing_factor: 4.0,
            use_spatialization: true,
            wet_gain_ratio: 0.9,
            max_emitters: 64,
        }
    }
}

impl DspConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_callback_length == 0 || self.max_callback_length > PV_DSP_MAX_CALLBACK_LENGTH {
            return Err(ConfigError::InvalidConfig(format!(
                "max_callback_length must be in 1..={PV_DSP_MAX_CALLBACK_LENGTH}"
            )));
        }
        if self.dsp_smoothing_factor < 1.0 {
            return Err(ConfigError::InvalidConfig(
                "dsp_smoothing_factor must be at least 1".into(),
            ));
        }
        if self.max_emitters == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_emitters must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
