//! Timing and thread-affinity utilities.
//!
//! `clock` provides a monotonic nanosecond clock, TSC-calibrated where the
//! platform exposes one. `affinity` carries over the teacher's CPU pinning
//! and real-time scheduling helpers.

pub mod affinity;
pub mod clock;

pub use affinity::{lock_memory, num_cores, optimize_for_hft, pin_to_core, set_realtime_priority};
pub use clock::now_ns;
