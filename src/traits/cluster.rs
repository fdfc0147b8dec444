//! Communication substrate
use crate::types::{ClusterIdentity, Rank, Result, RunningTotal, Tag};

/// The group of cooperating processes, as seen from one member.
///
/// All methods are called from the main thread of a process only.
pub trait Cluster {
    /// Identity of this process, captured once when the cluster handle is created
    fn identity(&self) -> ClusterIdentity;

    /// Blocking send of `values` to `destination`
    fn send(&self, values: &[u32], destination: Rank, tag: Tag) -> Result<()>;

    /// Blocking receive of exactly `len` values from `source`
    ///
    /// A message of any other length is a protocol violation.
    fn receive(&self, len: usize, source: Rank, tag: Tag) -> Result<Vec<u32>>;

    /// Wrapping sum of every process's `local` value.
    ///
    /// Collective: every process must call it. Returns `Some(total)` on the
    /// coordinator and `None` elsewhere, and no process returns before all have
    /// contributed.
    fn reduce_sum_to_coordinator(&self, local: RunningTotal) -> Result<Option<RunningTotal>>;

    /// Logical AND of every process's `ok`, delivered to all processes.
    ///
    /// Collective: every process must call it.
    fn all_agree(&self, ok: bool) -> Result<bool>;
}
