//! pv-dsp: the real-time per-emitter renderer that turns Planeverb's
//! acoustic parameters into a dry stereo bus and three wet reverb buses.
//!
//! [`DspContext`] is the crate's single public entry point; it owns no
//! background thread (unlike `pv_acoustic::EngineContext`) and is driven
//! directly from the host's audio callback, per `spec.md` §4.8/§4.9.

mod bus_gains;
mod context;
mod directivity;
mod lowpass;
mod output_bank;
mod panning;
mod state;

pub use bus_gains::{gain_a, gain_b, gain_c};
pub use context::{DspContext, DspOutput};
pub use directivity::directivity_gain;
pub use lowpass::LowpassFilter;
pub use panning::equal_power_pan;
pub use state::EmissionInput;
