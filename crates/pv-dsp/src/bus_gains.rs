//! Reverb-bus target gain computation: splits a single wet gain into three
//! parallel bus gains (`A`, `B`, `C`) as a partition of unity over the
//! emitter's RT60, so the three buses sum to exactly the input wet gain at
//! any RT60 value.
//!
//! Grounded on `original_source/PlaneverbDSP/src/PvDSPContext.cpp`'s
//! `FindGainA`/`FindGainB`/`FindGainC`, confirmed in `SPEC_FULL.md` §4.

use pv_core::{REVERB_BUS_T1, REVERB_BUS_T2, REVERB_BUS_T3, REVERB_BUS_TSTAR};

/// `10^(-3*T* / x)`: fraction of reverberant energy already decayed by the
/// time `x` (seconds) has elapsed, given the tuning time constant `T*`.
fn term(x: f64) -> f64 {
    10f64.powf(-3.0 * REVERB_BUS_TSTAR / x)
}

/// Bus A: energy that arrives before `T1`. Saturates at `gain` below `T1`
/// (a very short RT60 puts essentially all energy in the earliest bus) and
/// at `0` above `T2` (a long RT60 puts none of it there).
pub fn gain_a(rt60: f64, gain: f64) -> f64 {
    if rt60 < REVERB_BUS_T1 {
        gain
    } else if rt60 > REVERB_BUS_T2 {
        0.0
    } else {
        gain * (term(REVERB_BUS_T2) - term(rt60)) / (term(REVERB_BUS_T2) - term(REVERB_BUS_T1))
    }
}

/// Bus B: energy that arrives between `T1` and `T3`, split into the two
/// regions so `gain_a + gain_b` is continuous at `T1`/`T2` and
/// `gain_b + gain_c` is continuous at `T2`/`T3`.
pub fn gain_b(rt60: f64, gain: f64) -> f64 {
    if rt60 < REVERB_BUS_T1 || rt60 > REVERB_BUS_T3 {
        0.0
    } else if rt60 <= REVERB_BUS_T2 {
        gain - gain_a(rt60, gain)
    } else {
        gain * (term(REVERB_BUS_T3) - term(rt60)) / (term(REVERB_BUS_T3) - term(REVERB_BUS_T2))
    }
}

/// Bus C: energy that arrives after `T2`, saturating at `gain` above `T3`.
pub fn gain_c(rt60: f64, gain: f64) -> f64 {
    if rt60 < REVERB_BUS_T2 {
        0.0
    } else if rt60 > REVERB_BUS_T3 {
        gain
    } else {
        gain - gain_b(rt60, gain)
    }
}
