//! C-callable DSP API: renderer lifecycle, per-emitter transform/parameter
//! updates, and the four output-bus accessors, per `spec.md` §6.
//!
//! Grounded on `original_source/PlaneverbDSP/src/PvDSPContext.h`'s
//! public surface, reformulated the same way as [`crate::engine`]: an
//! opaque handle instead of a singleton.

use std::ptr;
use std::slice;

use pv_dsp::DspContext;

use crate::types::{PvDspConfig, PvEmissionInput, PvDirectivityPattern, PvVec2, PvError};

/// Opaque handle returned by [`pv_dsp_init`].
pub struct PvDspHandle {
    context: DspContext,
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_init(config: *const PvDspConfig) -> *mut PvDspHandle {
    if config.is_null() {
        crate::set_last_error(PvError::InvalidConfig);
        return ptr::null_mut();
    }
    let raw = unsafe { *config };
    match DspContext::new(raw.into()) {
        Ok(context) => {
            crate::set_last_error(PvError::Ok);
            Box::into_raw(Box::new(PvDspHandle { context }))
        }
        Err(e) => {
            crate::set_last_error(e.into());
            ptr::null_mut()
        }
    }
}

/// Frees the handle. A null `handle` is a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_exit(handle: *mut PvDspHandle) {
    if handle.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(handle) });
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_set_listener_transform(
    handle: *mut PvDspHandle,
    position: PvVec2,
    forward: PvVec2,
) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        handle.context.set_listener_transform(position.into(), forward.into());
    }
}

/// Returns `INVALID_EMISSION_ID` if `handle` is null or the table is
/// already at `max_emitters`.
#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_add_emitter(handle: *mut PvDspHandle) -> u32 {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return crate::types::INVALID_EMISSION_ID;
    };
    handle.context.add_emitter().unwrap_or(crate::types::INVALID_EMISSION_ID)
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_remove_emitter(handle: *mut PvDspHandle, id: u32) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        handle.context.remove_emitter(id);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_update_emitter(
    handle: *mut PvDspHandle,
    id: u32,
    position: PvVec2,
    forward: PvVec2,
) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        handle.context.update_emitter(id, position.into(), forward.into());
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_set_emitter_directivity_pattern(
    handle: *mut PvDspHandle,
    id: u32,
    pattern: PvDirectivityPattern,
) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        handle.context.set_emitter_directivity_pattern(id, pattern.into());
    }
}

/// Mixes `input` (`num_frames` interleaved stereo frames, so
/// `2 * num_frames` samples) for emitter `id` into the current callback's
/// output banks. A null `handle` or `input` is a no-op.
///
/// # Safety
/// `input` must point to at least `2 * num_frames` valid `f32`s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pv_dsp_send_source(
    handle: *mut PvDspHandle,
    id: u32,
    params: PvEmissionInput,
    input: *const f32,
    num_frames: usize,
) {
    if input.is_null() {
        return;
    }
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return;
    };
    let input = unsafe { slice::from_raw_parts(input, num_frames * 2) };
    handle.context.send_source(id, params.into(), input, num_frames);
}

/// Flips every output bank so this callback's mix becomes readable via
/// `pv_dsp_get_dry_buffer`/`get_buffer_a`/`b`/`c`. Returns `false` if no
/// emitter submitted audio since the previous call.
#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_process_output(handle: *mut PvDspHandle) -> bool {
    match unsafe { handle.as_mut() } {
        Some(handle) => handle.context.process_output(),
        None => false,
    }
}

fn buffer_out(
    slice: &[f32],
    out_len: *mut usize,
) -> *const f32 {
    if !out_len.is_null() {
        unsafe { *out_len = slice.len() };
    }
    slice.as_ptr()
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_get_dry_buffer(handle: *const PvDspHandle, out_len: *mut usize) -> *const f32 {
    match unsafe { handle.as_ref() } {
        Some(handle) => buffer_out(handle.context.dry_buffer(), out_len),
        None => {
            if !out_len.is_null() {
                unsafe { *out_len = 0 };
            }
            ptr::null()
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_get_buffer_a(handle: *const PvDspHandle, out_len: *mut usize) -> *const f32 {
    match unsafe { handle.as_ref() } {
        Some(handle) => buffer_out(handle.context.bus_a_buffer(), out_len),
        None => {
            if !out_len.is_null() {
                unsafe { *out_len = 0 };
            }
            ptr::null()
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_get_buffer_b(handle: *const PvDspHandle, out_len: *mut usize) -> *const f32 {
    match unsafe { handle.as_ref() } {
        Some(handle) => buffer_out(handle.context.bus_b_buffer(), out_len),
        None => {
            if !out_len.is_null() {
                unsafe { *out_len = 0 };
            }
            ptr::null()
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_dsp_get_buffer_c(handle: *const PvDspHandle, out_len: *mut usize) -> *const f32 {
    match unsafe { handle.as_ref() } {
        Some(handle) => buffer_out(handle.context.bus_c_buffer(), out_len),
        None => {
            if !out_len.is_null() {
                unsafe { *out_len = 0 };
            }
            ptr::null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PvDspConfig {
        PvDspConfig {
            max_callback_length: 1024,
            sampling_rate: 48_000,
            dsp_smoothing_factor: 4.0,
            use_spatialization: 1,
            wet_gain_ratio: 0.9,
            max_emitters: 8,
        }
    }

    #[test]
    fn init_add_exit_round_trip() {
        let config = test_config();
        let handle = pv_dsp_init(&config as *const _);
        assert!(!handle.is_null());
        let id = pv_dsp_add_emitter(handle);
        assert_ne!(id, crate::types::INVALID_EMISSION_ID);
        pv_dsp_exit(handle);
    }

    #[test]
    fn null_handle_buffer_accessors_report_empty() {
        let mut len: usize = 999;
        let ptr = pv_dsp_get_dry_buffer(ptr::null(), &mut len as *mut _);
        assert!(ptr.is_null());
        assert_eq!(len, 0);
    }

    #[test]
    fn send_source_and_process_output_round_trip() {
        let config = test_config();
        let handle = pv_dsp_init(&config as *const _);
        let id = pv_dsp_add_emitter(handle);
        pv_dsp_update_emitter(handle, id, PvVec2 { x: 1.0, y: 0.0 }, PvVec2 { x: -1.0, y: 0.0 });

        let params = PvEmissionInput {
            obstruction_gain: 1.0,
            wet_gain: 0.0,
            rt60: 0.0,
            lowpass: 20_000.0,
            direction: PvVec2 { x: 1.0, y: 0.0 },
            source_directivity: PvVec2 { x: 0.0, y: 0.0 },
        };
        let input = vec![1.0f32; 64 * 2];
        unsafe { pv_dsp_send_source(handle, id, params, input.as_ptr(), 64) };
        assert!(pv_dsp_process_output(handle));

        let mut len: usize = 0;
        let dry = pv_dsp_get_dry_buffer(handle, &mut len as *mut _);
        assert!(!dry.is_null());
        assert_eq!(len, 64 * 2);

        pv_dsp_exit(handle);
    }
}
