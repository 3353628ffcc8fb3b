//! C-callable Engine API: `Init`/`Exit`/`ChangeSettings`, emitter and
//! geometry CRUD, listener position, and the two read-only queries
//! (`GetOutput`, `GetImpulseResponse`), per `spec.md` §6.
//!
//! Grounded on `original_source/ProjectPlaneverb/src/Context/PvContext.h`'s
//! public surface, reformulated per `spec.md` §9 as an opaque handle rather
//! than a process-wide singleton: every function takes the handle `Init`
//! returned instead of reaching into global state, matching
//! `rf-bridge/src/container_ffi.rs`'s `#[unsafe(no_mangle)] pub extern "C"
//! fn` style without that module's global-singleton storage.

use std::ptr;

use pv_acoustic::EngineContext;

use crate::types::{
    try_engine_config, PvAcousticResult, PvEngineConfig, PvImpulseSample, PvVec3, PvError,
};

/// Opaque handle returned by [`pv_engine_init`]. Never constructed or
/// inspected from C; only ever passed back into this module's functions.
pub struct PvEngineHandle {
    context: EngineContext,
    /// Cache for `GetImpulseResponse`'s returned pointer, kept alive until
    /// the next call per `spec.md`'s "stable until next call" contract.
    impulse_response_cache: Vec<PvImpulseSample>,
}

/// Validates `config` and starts the engine's background worker. Returns
/// null on `InvalidConfig`/`NotEnoughMemory`; call [`pv_engine_last_error`]
/// to read the code.
#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_init(config: *const PvEngineConfig) -> *mut PvEngineHandle {
    if config.is_null() {
        crate::set_last_error(PvError::InvalidConfig);
        return ptr::null_mut();
    }
    let raw = unsafe { &*config };
    let Some(config) = try_engine_config(raw) else {
        crate::set_last_error(PvError::InvalidConfig);
        return ptr::null_mut();
    };

    match EngineContext::new(config) {
        Ok(context) => {
            crate::set_last_error(PvError::Ok);
            Box::into_raw(Box::new(PvEngineHandle {
                context,
                impulse_response_cache: Vec::new(),
            }))
        }
        Err(e) => {
            crate::set_last_error(e.into());
            ptr::null_mut()
        }
    }
}

/// Stops the worker and frees the handle. `handle` must not be used again.
/// A null `handle` is a no-op.
#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_exit(handle: *mut PvEngineHandle) {
    if handle.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(handle) });
}

/// `Exit` followed by `Init` with a new config, reusing the same handle
/// pointer so the caller's references to it remain valid. Returns an
/// error code; on failure the handle still points at a running engine
/// using its *previous* configuration (the source's "`ChangeSettings`
/// failure leaves the old instance untouched" behavior).
#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_change_settings(
    handle: *mut PvEngineHandle,
    config: *const PvEngineConfig,
) -> i32 {
    if handle.is_null() || config.is_null() {
        return PvError::InvalidConfig as i32;
    }
    let raw = unsafe { &*config };
    let Some(new_config) = try_engine_config(raw) else {
        return PvError::InvalidConfig as i32;
    };

    match EngineContext::new(new_config) {
        Ok(new_context) => {
            let handle = unsafe { &mut *handle };
            handle.context = new_context;
            handle.impulse_response_cache.clear();
            PvError::Ok as i32
        }
        Err(e) => PvError::from(e) as i32,
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_add_emitter(handle: *mut PvEngineHandle, position: PvVec3) -> u32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return crate::types::INVALID_EMISSION_ID;
    };
    handle.context.add_emitter(position.into())
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_update_emitter(handle: *mut PvEngineHandle, id: u32, position: PvVec3) {
    if let Some(handle) = unsafe { handle.as_ref() } {
        handle.context.update_emitter(id, position.into());
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_remove_emitter(handle: *mut PvEngineHandle, id: u32) {
    if let Some(handle) = unsafe { handle.as_ref() } {
        handle.context.remove_emitter(id);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_add_geometry(handle: *mut PvEngineHandle, aabb: crate::types::PvAabb) -> u32 {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return crate::types::INVALID_EMISSION_ID;
    };
    handle.context.add_geometry(aabb.into())
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_update_geometry(handle: *mut PvEngineHandle, id: u32, aabb: crate::types::PvAabb) {
    if let Some(handle) = unsafe { handle.as_ref() } {
        handle.context.update_geometry(id, aabb.into());
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_remove_geometry(handle: *mut PvEngineHandle, id: u32) {
    if let Some(handle) = unsafe { handle.as_ref() } {
        handle.context.remove_geometry(id);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_set_listener_position(handle: *mut PvEngineHandle, position: PvVec3) {
    if let Some(handle) = unsafe { handle.as_ref() } {
        handle.context.set_listener_position(position.into());
    }
}

/// Returns the sentinel result (`occlusion = -1`) for a null handle,
/// unknown emitter id, or an emitter position currently outside the grid.
#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_get_output(handle: *mut PvEngineHandle, emitter_id: u32) -> PvAcousticResult {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return pv_acoustic::AnalyzerResult::sentinel().into();
    };
    handle.context.get_output(emitter_id).into()
}

/// Distinguishes a sentinel `GetOutput` result from real data, per
/// `spec.md` §6's `IsOutputValid` flag.
#[unsafe(no_mangle)]
pub extern "C" fn pv_is_output_valid(result: PvAcousticResult) -> bool {
    result.occlusion >= 0.0
}

/// Debug accessor: the pressure/velocity impulse response at the cell
/// nearest `world_pos`. Writes the sample count to `*out_len` and returns
/// a pointer valid until the next call on this handle (or null, with
/// `*out_len = 0`, if `world_pos` falls outside the grid).
#[unsafe(no_mangle)]
pub extern "C" fn pv_engine_get_impulse_response(
    handle: *mut PvEngineHandle,
    world_pos: PvVec3,
    out_len: *mut usize,
) -> *const PvImpulseSample {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        if !out_len.is_null() {
            unsafe { *out_len = 0 };
        }
        return ptr::null();
    };

    match handle.context.get_impulse_response(world_pos.into()) {
        Some(response) => {
            handle.impulse_response_cache = response
                .iter()
                .map(|c| PvImpulseSample { p: c.p, vx: c.vx, vy: c.vy })
                .collect();
            if !out_len.is_null() {
                unsafe { *out_len = handle.impulse_response_cache.len() };
            }
            handle.impulse_response_cache.as_ptr()
        }
        None => {
            handle.impulse_response_cache.clear();
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
    use crate::types::{try_engine_config, PvGridCenteringType, PvVec2};

    fn test_config() -> PvEngineConfig {
        PvEngineConfig {
            grid_size_in_meters: PvVec2 { x: 10.0, y: 10.0 },
            grid_resolution: 275,
            grid_centering_type: PvGridCenteringType::Static,
            grid_world_offset: PvVec2 { x: 0.0, y: 0.0 },
        }
    }

    #[test]
    fn invalid_grid_resolution_is_rejected() {
        let mut config = test_config();
        config.grid_resolution = 1234;
        assert!(try_engine_config(&config).is_none());
    }

    #[test]
    fn null_handle_operations_are_safe_no_ops() {
        pv_engine_update_emitter(ptr::null_mut(), 0, PvVec3 { x: 0.0, y: 0.0, z: 0.0 });
        pv_engine_remove_emitter(ptr::null_mut(), 0);
        pv_engine_exit(ptr::null_mut());
        let result = pv_engine_get_output(ptr::null_mut(), 0);
        assert!(!pv_is_output_valid(result));
    }

    #[test]
    fn init_exit_round_trip() {
        let config = test_config();
        let handle = pv_engine_init(&config as *const _);
        assert!(!handle.is_null());
        let id = pv_engine_add_emitter(handle, PvVec3 { x: 1.0, y: 0.0, z: 1.0 });
        assert_ne!(id, crate::types::INVALID_EMISSION_ID);
        pv_engine_exit(handle);
    }
}
