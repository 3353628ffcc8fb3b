//! Grid sample type, shared between the FDTD step state and the per-cell
//! impulse-response buffers the Analyzer reads.
//!
//! The source uses one record for both the live simulation state and the
//! time-series response samples (see `SPEC_FULL.md` §4 for why this port
//! keeps that merge rather than splitting out a slimmer response-only
//! type: the response buffer is a plain `Vec<Cell>` already, and a second
//! type would only add a conversion with no allocation saved).

use pv_core::Sample;

/// One grid sample: pressure, staggered velocity components, and the
/// boundary/absorption coefficients that the FDTD stencil reads to decide
/// whether a cell is air, obstacle interior, or an obstacle surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cell {
    pub p: Sample,
    pub vx: Sample,
    pub vy: Sample,
    /// 1 for air, 0 on the padded border or inside an obstacle.
    pub b: bool,
    /// Secondary boundary flag; 1 for interior air cells, 0 on the padded
    /// border, the first column, and inside an obstacle.
    pub bx: bool,
    /// Absorption coefficient in `[0, 1]`; meaningful only where `b` is
    /// `false` (an obstacle surface or interior).
    pub r: Sample,
}

impl Cell {
    /// A free-space air cell: `b = bx = true`, `r = 0`.
    pub const fn air() -> Self {
        Self {
            p: 0.0,
            vx: 0.0,
            vy: 0.0,
            b: true,
            bx: true,
            r: 0.0,
        }
    }

    /// Zeroes the dynamic simulation state (`p`, `vx`, `vy`) while leaving
    /// the boundary mask and absorption coefficient untouched, matching the
    /// "zero pressure and velocity, keep `b`, `bx`, `R`" reset the FDTD step
    /// performs before each impulse response.
    #[inline]
    pub fn reset_dynamics(&mut self) {
        self.p = 0.0;
        self.vx = 0.0;
        self.vy = 0.0;
    }
}

/// Per-cell impulse response: one [`Cell`] snapshot per simulated timestep.
pub type ImpulseResponse = Vec<Cell>;
