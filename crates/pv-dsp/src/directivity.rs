//! Source directivity gain: how much of an emitter's radiated energy
//! reaches the listener along the measured source radiation direction,
//! given the emitter's own facing.
//!
//! Grounded on `original_source/PlaneverbDSP/src/PvDSPContext.cpp`'s
//! cardioid gain block; the floor at `MIN_DRY_GAIN` (rather than 0) is the
//! supplement recorded in `SPEC_FULL.md` §9.

use pv_core::{SourceDirectivityPattern, Vec2, MIN_DRY_GAIN};

/// `source_direction` is the source radiation direction reported by the
/// Analyzer; `forward` is the emitter's own facing vector.
pub fn directivity_gain(
    pattern: SourceDirectivityPattern,
    source_direction: Vec2,
    forward: Vec2,
) -> f64 {
    match pattern {
        SourceDirectivityPattern::Omni => 1.0,
        SourceDirectivityPattern::Cardioid => {
            ((1.0 + source_direction.dot(forward)) * 0.5).max(MIN_DRY_GAIN)
        }
    }
}
