//! Physical and analysis constants shared by the acoustic engine and DSP
//! renderer. Values and formulas follow `spec.md`; where the spec is silent
//! on a numeric constant, the value is taken from the original source it
//! was distilled from (see `DESIGN.md`).

/// Speed of sound in air, m/s.
pub const SPEED_OF_SOUND: f64 = 343.21;

/// Points per wavelength: minimum spatial sampling density for the grid's
/// configured maximum frequency.
pub const POINTS_PER_WAVELENGTH: f64 = 3.5;

/// `-80 dB` expressed as a linear pressure gain; onset detection threshold.
pub const AUDIBLE_THRESHOLD_GAIN: f64 = 1e-4;

/// `-1 dB` expressed as a linear gain; the neighbour walk keeps hopping
/// while a cell's occlusion is below this loudness threshold.
pub const DISTANCE_GAIN_THRESHOLD: f64 = 0.891_251;

/// "Close enough" delay threshold (samples) before the neighbour walk stops
/// purely on proximity to the source, absent a line-of-sight break.
pub const DELAY_CLOSE_THRESHOLD: f64 = 5.0;

/// Length of the early-pressure/velocity flux window used for source
/// radiation direction, seconds.
pub const DRY_DIRECTION_ANALYSIS_LENGTH_S: f64 = 0.005;

/// Length of the dry-energy window used for obstruction gain, seconds.
pub const DRY_GAIN_ANALYSIS_LENGTH_S: f64 = 0.01;

/// Length of the early-reflection window used for wet gain, seconds.
pub const WET_GAIN_ANALYSIS_LENGTH_S: f64 = 0.080;

/// Trailing portion of the response excluded from the backward-Schroeder
/// regression, seconds.
pub const SCHROEDER_OFFSET_S: f64 = 0.01;

/// Minimum and maximum audible frequency, Hz.
pub const MIN_AUDIBLE_FREQ: f64 = 20.0;
pub const MAX_AUDIBLE_FREQ: f64 = 20_000.0;

/// Floor applied to the composite dry gain and to directivity gain so an
/// emitter never goes perfectly silent from occlusion or panning alone.
pub const MIN_DRY_GAIN: f64 = 0.01;

/// Reference decay times partitioning the three reverb buses.
pub const REVERB_BUS_T1: f64 = 0.5;
pub const REVERB_BUS_T2: f64 = 1.0;
pub const REVERB_BUS_T3: f64 = 3.0;

/// Time constant used by the bus-gain partition formula, seconds.
pub const REVERB_BUS_TSTAR: f64 = 0.1;

/// Hard cap on a single DSP callback length.
pub const PV_DSP_MAX_CALLBACK_LENGTH: usize = 4096;

/// `1/sqrt(2)`, the equal-power panning normalization constant.
pub const INV_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// `threshold_los = 0.3 * c / f_max` is computed per-grid (it depends on
/// the configured resolution) rather than being a single constant; see
/// `pv_acoustic::analyzer`.
pub const LOS_THRESHOLD_FACTOR: f64 = 0.3;
