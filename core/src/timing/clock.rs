//! Monotonic nanosecond clock.
//!
//! On `x86_64`, calibrates the TSC against `std::time::Instant` at startup
//! (a >=100ms sampling window per spec) and converts cycles to nanoseconds
//! with a pre-computed scale factor. Falls back to `Instant` directly when
//! no cycle counter is available or calibration hasn't run yet. The epoch
//! is implementation-defined; only monotonicity is guaranteed.

use std::sync::OnceLock;
use std::time::Instant;

struct Calibration {
    base_instant: Instant,
    base_tsc: u64,
    ns_per_cycle: f64,
}

static CALIBRATION: OnceLock<Calibration> = OnceLock::new();
static PROCESS_START: OnceLock<Instant> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_tsc() -> u64 {
    // SAFETY: rdtsc is always available on x86_64 (no CPUID gating needed
    // for a plain, non-serializing cycle read).
    unsafe { core::arch::x86_64::_rdtsc() }
}

/// Calibrate the TSC-to-nanosecond scale factor by sampling over a
/// wall-clock window. Call once at startup before relying on `now_ns()` for
/// cross-process-comparable precision; if never called, `now_ns()` still
/// works (falling back to `Instant`), just without TSC.
#[cfg(target_arch = "x86_64")]
pub fn calibrate(window: std::time::Duration) {
    let start_instant = Instant::now();
    let start_tsc = read_tsc();
    std::thread::sleep(window);
    let end_instant = Instant::now();
    let end_tsc = read_tsc();

    let elapsed_ns = end_instant.duration_since(start_instant).as_nanos() as f64;
    let elapsed_cycles = end_tsc.saturating_sub(start_tsc) as f64;
    if elapsed_cycles <= 0.0 {
        return;
    }
    let ns_per_cycle = elapsed_ns / elapsed_cycles;

    let _ = CALIBRATION.set(Calibration {
        base_instant: start_instant,
        base_tsc: start_tsc,
        ns_per_cycle,
    });
    tracing::info!(ns_per_cycle, "TSC calibrated");
}

#[cfg(not(target_arch = "x86_64"))]
pub fn calibrate(_window: std::time::Duration) {
    tracing::warn!("TSC calibration unavailable on this architecture; using monotonic clock");
}

fn process_start() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

/// Nanoseconds since an implementation-defined epoch. Monotonic; not
/// comparable across processes or to wall time.
#[inline]
pub fn now_ns() -> u64 {
    #[cfg(target_arch = "x86_64")]
    {
        if let Some(cal) = CALIBRATION.get() {
            let cycles = read_tsc().saturating_sub(cal.base_tsc);
            let offset_ns = (cycles as f64 * cal.ns_per_cycle) as u64;
            let base_ns = cal
                .base_instant
                .duration_since(process_start())
                .as_nanos() as u64;
            return base_ns + offset_ns;
        }
    }
    Instant::now().duration_since(process_start()).as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_without_calibration() {
        let a = now_ns();
        let b = now_ns();
        assert!(b >= a);
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn calibration_keeps_clock_monotonic() {
        let before = now_ns();
        calibrate(std::time::Duration::from_millis(5));
        let after = now_ns();
        assert!(after >= before);
    }
}
