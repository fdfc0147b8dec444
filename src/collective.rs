//! Group-wide operations: the start-up vote and the final combine
use crate::traits::Cluster;
use crate::types::{Error, Result, RunningTotal, ThreadSupport};
use log::{debug, error, info};

/// Combine every process's total into the grand total at the coordinator.
///
/// Every process must call this. Returns `Some(total)` on the coordinator and
/// `None` elsewhere.
pub fn combine_totals<C: Cluster + ?Sized>(
    cluster: &C,
    local: RunningTotal,
) -> Result<Option<RunningTotal>> {
    let identity = cluster.identity();
    debug!("Rank {} contributing {local}", identity.rank);
    let total = cluster.reduce_sum_to_coordinator(local)?;
    if let Some(total) = total {
        info!("Combined totals of {} processes: {total}", identity.size);
    }
    Ok(total)
}

/// Check whether the runtime can host `threads` worker threads per process.
///
/// A single thread never needs more than the runtime provides.
pub fn check_thread_support(
    threads: usize,
    required: ThreadSupport,
    provided: ThreadSupport,
) -> Result<()> {
    if threads > 1 && provided < required {
        Err(Error::Capability {
            threads,
            required,
            provided,
        })
    } else {
        Ok(())
    }
}

/// Agree collectively to start the run.
///
/// `local` is this process's readiness. Every process votes before any data is
/// transferred; if any vote fails, every process returns an error, so none is
/// left waiting for a peer that has given up. A process that voted against the
/// run gets its own error back.
pub fn agree_to_start<C: Cluster + ?Sized, T>(cluster: &C, local: Result<T>) -> Result<T> {
    let all_ready = cluster.all_agree(local.is_ok())?;
    match local {
        Err(e) => {
            error!("Rank {} cannot start: {e}", cluster.identity().rank);
            Err(e)
        }
        Ok(_) if !all_ready => Err(Error::PeerAborted),
        ready => ready,
    }
}
