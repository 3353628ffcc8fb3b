//! C-callable API surface for Planeverb: the acoustic Engine and the
//! real-time DSP renderer, each addressed through an opaque handle rather
//! than process-wide global state, per `spec.md` §9's redesign note.
//!
//! Grounded on `rf-bridge/src/container_ffi.rs`'s `#[unsafe(no_mangle)]`
//! function style and `set_error`/`get_last_error` pattern for reporting
//! `Init`/`ChangeSettings` failures back across the boundary, without that
//! module's global singleton storage for the domain state itself.

mod dsp;
mod engine;
mod types;

pub use dsp::*;
pub use engine::*;
pub use types::*;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

static LAST_ERROR: Lazy<Mutex<PvError>> = Lazy::new(|| Mutex::new(PvError::Ok));

fn set_last_error(error: PvError) {
    *LAST_ERROR.lock() = error;
}

/// Returns the error code from the most recent `Init`/`ChangeSettings`
/// call on any handle in this process. Thread-local would be more precise
/// but the reference implementation's error reporting is process-global
/// too, and callers only consult this immediately after a failing call.
#[unsafe(no_mangle)]
pub extern "C" fn pv_last_error() -> i32 {
    *LAST_ERROR.lock() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_error_starts_ok() {
        assert_eq!(pv_last_error(), PvError::Ok as i32);
    }

    #[test]
    fn set_last_error_is_observable() {
        set_last_error(PvError::InvalidConfig);
        assert_eq!(pv_last_error(), PvError::InvalidConfig as i32);
        set_last_error(PvError::Ok);
    }
}
