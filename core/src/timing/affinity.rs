//! CPU affinity, real-time scheduling, and memory locking.
//!
//! Carried over from the teacher's `perf::cpu` almost verbatim: HFT threads
//! need to stay on one core and avoid page faults under load.

use anyhow::Result;
use core_affinity::CoreId;

/// Pin the current thread to a specific CPU core.
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };
    if core_affinity::set_for_current(core_id) {
        tracing::info!("Pinned thread to CPU core {}", core);
        Ok(())
    } else {
        anyhow::bail!("Failed to pin thread to core {}", core)
    }
}

/// Set real-time (`SCHED_FIFO`) thread priority. Requires `CAP_SYS_NICE` or
/// root. On refusal, the caller should log a warning and continue — latency
/// suffers but correctness doesn't.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    let param = sched_param {
        sched_priority: priority,
    };

    // SAFETY: `sched_setscheduler` with pid 0 affects only the calling
    // thread's scheduling class; `param` is a valid, fully initialized
    // `sched_param`.
    let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc == 0 {
        tracing::info!("Set thread priority to SCHED_FIFO:{}", priority);
        Ok(())
    } else {
        anyhow::bail!("Failed to set thread priority (may need CAP_SYS_NICE or root)")
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    tracing::warn!("Real-time priority setting not supported on this platform");
    Ok(())
}

/// Lock all current and future pages of this process into RAM, avoiding
/// page faults on the hot path. Linux only; a no-op elsewhere.
#[cfg(target_os = "linux")]
pub fn lock_memory() -> Result<()> {
    use libc::{mlockall, MCL_CURRENT, MCL_FUTURE};

    // SAFETY: `mlockall` takes no pointers; failure just returns -1.
    let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
    if rc == 0 {
        tracing::info!("Locked process memory pages (mlockall)");
        Ok(())
    } else {
        anyhow::bail!("mlockall failed (may need CAP_IPC_LOCK or root)")
    }
}

#[cfg(not(target_os = "linux"))]
pub fn lock_memory() -> Result<()> {
    tracing::warn!("Memory locking not supported on this platform");
    Ok(())
}

pub fn num_cores() -> usize {
    core_affinity::get_core_ids()
        .map(|ids| ids.len())
        .unwrap_or(1)
}

/// Pin to `core` and request real-time priority; log and continue on
/// failure rather than aborting startup (spec.md §4.B fallback rule).
pub fn optimize_for_hft(core: usize, priority: i32) {
    if let Err(e) = pin_to_core(core) {
        tracing::warn!(error = %e, core, "failed to pin thread, continuing unpinned");
    }
    if let Err(e) = set_realtime_priority(priority) {
        tracing::warn!(error = %e, priority, "failed to set real-time priority, continuing with default policy");
    }
}
