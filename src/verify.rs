//! Verification and reporting
use crate::partition::Partition;
use crate::types::{ClusterIdentity, Result, RunningTotal};
use log::{error, info};
use std::io::Write;

/// Outcome of a run, as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Total computed while generating the value set
    pub expected: RunningTotal,
    /// Total delivered by the collective
    pub actual: RunningTotal,
}

impl Verification {
    /// Compare the totals, logging the outcome
    pub fn new(expected: RunningTotal, actual: RunningTotal) -> Self {
        let verification = Self { expected, actual };
        if verification.passed() {
            info!("Totals agree: {expected}");
        } else {
            error!("Totals disagree: expected {expected}, actual {actual}");
        }
        verification
    }

    /// Did the distributed reduction reproduce the expected total?
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }

    /// Print both totals
    pub fn write_report<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Expected result: {}", self.expected)?;
        writeln!(out, "Actual result:   {}", self.actual)?;
        Ok(())
    }
}

/// Announce that a process has started
pub fn write_announcement<W: Write + ?Sized>(
    identity: &ClusterIdentity,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Process {} started", identity.rank)?;
    Ok(())
}

/// Describe the shape of the run
pub fn write_configuration<W: Write + ?Sized>(
    cluster_size: usize,
    partition: &Partition,
    out: &mut W,
) -> Result<()> {
    writeln!(
        out,
        "{} processes, {} threads per process, {} values per thread",
        cluster_size,
        partition.threads_per_process(),
        partition.values_per_thread()
    )?;
    Ok(())
}
