//! Per-emitter DSP state table: the externally-written `target` record and
//! the internally-advanced `current` record the renderer lerps toward it
//! every callback, per `spec.md` §3's `EmissionDSPState` and the
//! redesign note in §9 ("keep the target as the externally-written field
//! and the current as the internally-advanced field").
//!
//! Grounded on `original_source/PlaneverbDSP/src/Emissions/EmissionManager.h`'s
//! `EmissionData`/`EmissionsManager`, reformulated per `SPEC_FULL.md` §9
//! Open Question 3 as a dense `Vec<Option<EmissionState>>` with a free-list
//! (capacity `max_emitters`, set once at construction) rather than the
//! source's `std::unordered_map`.

use pv_core::{SourceDirectivityPattern, Vec2};

use crate::lowpass::LowpassFilter;

/// Acoustic parameters as submitted by `SendSource`, written directly into
/// an emitter's `target` record (no smoothing is applied to this write;
/// the renderer smooths toward its *derived* gains over subsequent
/// callbacks — see [`EmissionCurrent`]).
#[derive(Debug, Clone, Copy)]
pub struct EmissionInput {
    pub occlusion: f64,
    pub wet_gain: f64,
    pub rt60: f64,
    pub lowpass: f64,
    pub direction: Vec2,
    pub source_directivity: Vec2,
}

/// The renderer's live, per-callback-advancing output state for one
/// emitter: the lowpass filter's own state, plus every gain the renderer
/// mixes with, each lerped a little closer to this callback's target every
/// sample so playback never clicks on a parameter change.
#[derive(Debug, Clone)]
pub struct EmissionCurrent {
    pub lpf: LowpassFilter,
    pub gain_a: f64,
    pub gain_b: f64,
    pub gain_c: f64,
    pub pan_l: f64,
    pub pan_r: f64,
    pub dry_gain: f64,
}

impl EmissionCurrent {
    fn new(sampling_rate: f64) -> Self {
        Self {
            lpf: LowpassFilter::new(sampling_rate, 20_000.0),
            gain_a: 0.0,
            gain_b: 0.0,
            gain_c: 0.0,
            pan_l: pv_core::INV_SQRT_2,
            pan_r: pv_core::INV_SQRT_2,
            dry_gain: 1.0,
        }
    }
}

/// The most recently submitted values for one emitter: the renderer's lerp
/// target. `forward`/`position` are written by `UpdateEmitter`
/// independently of `SendSource`'s acoustic parameters.
#[derive(Debug, Clone)]
pub struct EmissionTarget {
    pub occlusion: f64,
    pub wet_gain: f64,
    pub rt60: f64,
    pub lowpass: f64,
    pub direction: Vec2,
    pub source_directivity: Vec2,
    pub forward: Vec2,
    pub position: Vec2,
}

impl Default for EmissionTarget {
    fn default() -> Self {
        Self {
            occlusion: 1.0,
            wet_gain: 0.0,
            rt60: 0.0,
            lowpass: 20_000.0,
            direction: Vec2::new(1.0, 0.0),
            source_directivity: Vec2::ZERO,
            forward: Vec2::new(1.0, 0.0),
            position: Vec2::ZERO,
        }
    }
}

/// One emitter's full DSP state. `directivity_pattern` is a discrete,
/// non-interpolated selector (set by `SetEmitterDirectivityPattern`) and so
/// is kept as a single field rather than duplicated across current/target:
/// the source's reference implementation writes it only into the target
/// record and never propagates it into the one the renderer actually
/// reads, so a pattern change never takes effect. Applying it immediately
/// here is the resolution for that gap.
pub struct EmissionState {
    pub current: EmissionCurrent,
    pub target: EmissionTarget,
    pub directivity_pattern: SourceDirectivityPattern,
}

impl EmissionState {
    fn new(sampling_rate: f64) -> Self {
        Self {
            current: EmissionCurrent::new(sampling_rate),
            target: EmissionTarget::default(),
            directivity_pattern: SourceDirectivityPattern::Omni,
        }
    }
}

/// Dense, slot-reused table of [`EmissionState`], bounded at `max_emitters`
/// so adding beyond capacity fails cleanly instead of growing unbounded.
pub struct EmissionTable {
    slots: Vec<Option<EmissionState>>,
    free_list: Vec<u32>,
    capacity: usize,
    sampling_rate: f64,
}

impl EmissionTable {
    pub fn new(capacity: usize, sampling_rate: f64) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            capacity,
            sampling_rate,
        }
    }

    /// Returns the new emitter's id, or `None` if the table is already at
    /// `max_emitters` (the caller maps this to `INVALID_EMISSION_ID`).
    pub fn add(&mut self) -> Option<u32> {
        if let Some(id) = self.free_list.pop() {
            self.slots[id as usize] = Some(EmissionState::new(self.sampling_rate));
            return Some(id);
        }
        if self.slots.len() >= self.capacity {
            return None;
        }
        self.slots.push(Some(EmissionState::new(self.sampling_rate)));
        Some((self.slots.len() - 1) as u32)
    }

    pub fn remove(&mut self, id: u32) {
        if let Some(slot) = self.slots.get_mut(id as usize) {
            if slot.take().is_some() {
                self.free_list.push(id);
            }
        }
    }

    pub fn get(&self, id: u32) -> Option<&EmissionState> {
        self.slots.get(id as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut EmissionState> {
        self.slots.get_mut(id as usize).and_then(|s| s.as_mut())
    }

    /// Lazily materializes a slot for `id` if the host addresses an
    /// emitter it hasn't explicitly `add`ed yet (mirrors the source's
    /// `insert_or_assign`-on-first-access map semantics, bounded to
    /// already-allocated slots since this table has fixed capacity).
    pub fn get_or_insert_mut(&mut self, id: u32) -> Option<&mut EmissionState> {
        if (id as usize) < self.slots.len() {
            let slot = &mut self.slots[id as usize];
            if slot.is_none() {
                *slot = Some(EmissionState::new(self.sampling_rate));
            }
            return slot.as_mut();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_enforced() {
        let mut table = EmissionTable::new(2, 48_000.0);
        assert!(table.add().is_some());
        assert!(table.add().is_some());
        assert!(table.add().is_none());
    }

    #[test]
    fn removed_slot_is_recycled() {
        let mut table = EmissionTable::new(2, 48_000.0);
        let id = table.add().unwrap();
        table.remove(id);
        let id2 = table.add().unwrap();
        assert_eq!(id, id2);
    }
}
