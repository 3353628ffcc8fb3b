//! Authoritative scene AABB table and the pending-change queue the engine
//! worker drains once per iteration.
//!
//! Grounded on the `rf-audio`/`rf-engine` pattern of a short-held
//! `parking_lot::Mutex` guarding a plain `Vec` rather than a channel: the
//! correctness requirement here ("queue is fully drained each iteration, in
//! submission order") is a property of `Vec::drain`, not of a
//! producer/consumer channel.

use log::debug;
use parking_lot::Mutex;
use pv_core::{Aabb, GridCenteringType, Vec2};

use crate::grid::Grid;

const RECENTER_DELTA: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub enum GeometryChange {
    Add(Aabb),
    Remove(Aabb),
}

struct GeometryEntry {
    aabb: Aabb,
}

pub struct GeometryManager {
    entries: Vec<Option<GeometryEntry>>,
    free_list: Vec<u32>,
    pending: Mutex<Vec<GeometryChange>>,
    last_listener: Vec2,
    centering: GridCenteringType,
}

impl GeometryManager {
    pub fn new(centering: GridCenteringType) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            pending: Mutex::new(Vec::new()),
            last_listener: Vec2::ZERO,
            centering,
        }
    }

    pub fn add(&mut self, aabb: Aabb) -> u32 {
        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id as usize] = Some(GeometryEntry { aabb });
            id
        } else {
            self.entries.push(Some(GeometryEntry { aabb }));
            (self.entries.len() - 1) as u32
        };
        self.pending.lock().push(GeometryChange::Add(aabb));
        id
    }

    pub fn update(&mut self, id: u32, new_aabb: Aabb) {
        let Some(slot) = self.entries.get_mut(id as usize) else {
            return;
        };
        let Some(entry) = slot else { return };
        let old_aabb = entry.aabb;
        entry.aabb = new_aabb;

        match self.centering {
            GridCenteringType::Static => {
                let mut pending = self.pending.lock();
                pending.push(GeometryChange::Remove(old_aabb));
                pending.push(GeometryChange::Add(new_aabb));
            }
            GridCenteringType::Dynamic => {
                // Table updated only; the next re-centring re-rasterizes
                // every live AABB from scratch.
            }
        }
    }

    pub fn remove(&mut self, id: u32) {
        let Some(slot) = self.entries.get_mut(id as usize) else {
            return;
        };
        let Some(entry) = slot.take() else { return };
        self.free_list.push(id);

        if matches!(self.centering, GridCenteringType::Static) {
            self.pending.lock().push(GeometryChange::Remove(entry.aabb));
        }
    }

    fn live_aabbs(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.entries.iter().filter_map(|e| e.as_ref().map(|e| e.aabb))
    }

    /// Called by the engine worker between FDTD iterations. In dynamic
    /// centring, if the listener moved far enough, every live AABB is
    /// re-enqueued as an `Add` and the grid is cleared first; the pending
    /// queue is then drained onto `grid` in submission order.
    pub fn push_changes(&mut self, grid: &mut Grid, listener: Vec2) {
        if matches!(self.centering, GridCenteringType::Dynamic) {
            let moved = (listener.x - self.last_listener.x).abs() >= RECENTER_DELTA
                || (listener.y - self.last_listener.y).abs() >= RECENTER_DELTA;
            if moved {
                debug!("listener re-centred grid; re-rasterizing {} AABBs", self.entries.len());
                grid.clear_aabbs();
                let mut pending = self.pending.lock();
                for aabb in self.live_aabbs() {
                    pending.push(GeometryChange::Add(aabb));
                }
            }
        }
        self.last_listener = listener;

        let changes: Vec<GeometryChange> = self.pending.lock().drain(..).collect();
        for change in changes {
            match change {
                GeometryChange::Add(aabb) => grid.add_aabb(&aabb),
                GeometryChange::Remove(aabb) => grid.remove_aabb(&aabb),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_enqueues_change() {
        let mut mgr = GeometryManager::new(GridCenteringType::Static);
        let aabb = Aabb::new(Vec2::new(1.0, 1.0), 1.0, 1.0, 0.5);
        mgr.add(aabb);
        assert_eq!(mgr.pending.lock().len(), 1);
    }

    #[test]
    fn update_in_static_mode_enqueues_remove_then_add() {
        let mut mgr = GeometryManager::new(GridCenteringType::Static);
        let a = Aabb::new(Vec2::new(1.0, 1.0), 1.0, 1.0, 0.5);
        let id = mgr.add(a);
        mgr.pending.lock().clear();

        let b = Aabb::new(Vec2::new(2.0, 2.0), 1.0, 1.0, 0.5);
        mgr.update(id, b);
        let pending = mgr.pending.lock();
        assert_eq!(pending.len(), 2);
        assert!(matches!(pending[0], GeometryChange::Remove(_)));
        assert!(matches!(pending[1], GeometryChange::Add(_)));
    }

    #[test]
    fn remove_recycles_id() {
        let mut mgr = GeometryManager::new(GridCenteringType::Static);
        let a = Aabb::new(Vec2::new(1.0, 1.0), 1.0, 1.0, 0.5);
        let id = mgr.add(a);
        mgr.remove(id);
        let b = Aabb::new(Vec2::new(3.0, 3.0), 1.0, 1.0, 0.5);
        let id2 = mgr.add(b);
        assert_eq!(id, id2);
    }
}
