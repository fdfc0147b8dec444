//! Driving a full run on one process
use crate::collective::{agree_to_start, check_thread_support, combine_totals};
use crate::generate::generate;
use crate::partition::Partition;
use crate::reduce::ThreadedReducer;
use crate::traits::Cluster;
use crate::transport::{receive_from_coordinator, scatter_from_coordinator, DATA_TAG};
use crate::types::{Error, Result, Tag, ThreadSupport};
use crate::verify::{write_configuration, Verification};
use log::{info, warn};
use std::io::Write;

/// Options for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Worker threads on every process
    threads_per_process: usize,
    /// Values summed by each worker thread
    values_per_thread: usize,
    /// Tag carried by value transfers
    data_tag: Tag,
    /// Thread support needed when a process runs more than one thread
    required_thread_support: ThreadSupport,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads_per_process: 1,
            values_per_thread: 0,
            data_tag: DATA_TAG,
            required_thread_support: ThreadSupport::Funneled,
        }
    }
}

impl RunConfig {
    /// Create options for the given shape
    pub fn new(threads_per_process: usize, values_per_thread: usize) -> Self {
        Self {
            threads_per_process,
            values_per_thread,
            ..Default::default()
        }
    }

    /// Worker threads on every process
    pub fn threads_per_process(&self) -> usize {
        self.threads_per_process
    }

    /// Values summed by each worker thread
    pub fn values_per_thread(&self) -> usize {
        self.values_per_thread
    }

    /// Tag carried by value transfers
    pub fn data_tag(&self) -> Tag {
        self.data_tag
    }

    /// Thread support needed for multi-threaded processes
    pub fn required_thread_support(&self) -> ThreadSupport {
        self.required_thread_support
    }

    /// Set the tag carried by value transfers
    pub fn set_data_tag(&mut self, tag: Tag) {
        self.data_tag = tag;
    }

    /// Set the thread support needed for multi-threaded processes
    pub fn set_required_thread_support(&mut self, support: ThreadSupport) {
        self.required_thread_support = support;
    }
}

/// Parse a count from the command line.
///
/// Negative values clamp to zero.
pub fn parse_count(arg: &str) -> std::result::Result<usize, String> {
    let value = arg
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("'{arg}' is not an integer: {e}"))?;
    usize::try_from(value.max(0)).map_err(|e| format!("'{arg}' is too large: {e}"))
}

/// Run this process's part of the reduction.
///
/// Returns the verification on the coordinator and `None` on every other
/// process. Status lines are written to `out` by the coordinator only.
pub fn run<C: Cluster + ?Sized, W: Write + ?Sized>(
    cluster: &C,
    config: &RunConfig,
    out: &mut W,
) -> Result<Option<Verification>> {
    let identity = cluster.identity();
    let threads = config.threads_per_process();
    if threads == 0 {
        warn!(
            "Rank {} has no worker threads and contributes a zero total",
            identity.rank
        );
    }

    // Everything that can fail locally is settled before the vote
    let ready = check_thread_support(
        threads,
        config.required_thread_support(),
        identity.thread_support,
    )
    .and_then(|()| Partition::new(threads, config.values_per_thread()))
    .and_then(|partition| {
        partition.total_count(identity.size)?;
        Ok((partition, ThreadedReducer::new(threads)?))
    });
    let (partition, reducer) = agree_to_start(cluster, ready)?;

    if identity.is_coordinator() {
        write_configuration(identity.size, &partition, out)?;
        let dataset = generate(partition.total_count(identity.size)?);
        let own =
            scatter_from_coordinator(cluster, &partition, &dataset.values, config.data_tag())?;
        let local = reducer.sum(&partition, own)?;
        let actual = combine_totals(cluster, local)?.ok_or(Error::MissingTotal)?;
        let verification = Verification::new(dataset.expected_total, actual);
        verification.write_report(out)?;
        Ok(Some(verification))
    } else {
        let values = receive_from_coordinator(cluster, &partition, config.data_tag())?;
        let local = reducer.sum(&partition, &values)?;
        info!("Rank {} local total {local}", identity.rank);
        combine_totals(cluster, local)?;
        Ok(None)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12").unwrap(), 12);
        assert_eq!(parse_count("0").unwrap(), 0);
        assert_eq!(parse_count("-1").unwrap(), 0);
        assert_eq!(parse_count("-4000").unwrap(), 0);
        assert_eq!(parse_count(" 7 ").unwrap(), 7);
        assert!(parse_count("seven").is_err());
        assert!(parse_count("").is_err());
    }

    #[test]
    fn test_config() {
        let mut config = RunConfig::new(4, 1000);
        assert_eq!(config.threads_per_process(), 4);
        assert_eq!(config.values_per_thread(), 1000);
        assert_eq!(config.data_tag(), DATA_TAG);
        assert_eq!(config.required_thread_support(), ThreadSupport::Funneled);
        config.set_data_tag(9);
        config.set_required_thread_support(ThreadSupport::Multiple);
        assert_eq!(config.data_tag(), 9);
        assert_eq!(config.required_thread_support(), ThreadSupport::Multiple);
    }
}
