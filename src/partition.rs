//! Mapping of the flat index space onto (process, thread) coordinates
use crate::types::{Error, Rank, Result};
use itertools::iproduct;
use std::ops::Range;

/// Equal-sized contiguous partition of a value set.
///
/// Process `r` owns `[r * T * V, (r + 1) * T * V)` and, within it, thread `t`
/// owns the `V` values starting at offset `t * V`, where `T` is the number of
/// threads per process and `V` the number of values per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    threads_per_process: usize,
    values_per_thread: usize,
    values_per_process: usize,
}

impl Partition {
    /// Create a partition
    pub fn new(threads_per_process: usize, values_per_thread: usize) -> Result<Self> {
        let values_per_process = threads_per_process
            .checked_mul(values_per_thread)
            .ok_or(Error::PartitionOverflow {
                processes: 1,
                threads: threads_per_process,
                values: values_per_thread,
            })?;
        Ok(Self {
            threads_per_process,
            values_per_thread,
            values_per_process,
        })
    }

    /// Number of threads per process
    pub fn threads_per_process(&self) -> usize {
        self.threads_per_process
    }

    /// Number of values per thread
    pub fn values_per_thread(&self) -> usize {
        self.values_per_thread
    }

    /// Number of values per process
    pub fn values_per_process(&self) -> usize {
        self.values_per_process
    }

    /// Number of values across a cluster of `process_count` processes
    pub fn total_count(&self, process_count: usize) -> Result<usize> {
        self.values_per_process
            .checked_mul(process_count)
            .ok_or(Error::PartitionOverflow {
                processes: process_count,
                threads: self.threads_per_process,
                values: self.values_per_thread,
            })
    }

    /// Global index range owned by a process
    ///
    /// The caller must ensure that the end of the range does not overflow, which
    /// [`Partition::total_count`] checks for the whole cluster.
    pub fn process_range(&self, rank: Rank) -> Range<usize> {
        rank * self.values_per_process..(rank + 1) * self.values_per_process
    }

    /// Index range of a thread relative to the start of its process's buffer
    pub fn local_thread_range(&self, thread: usize) -> Range<usize> {
        thread * self.values_per_thread..(thread + 1) * self.values_per_thread
    }

    /// Global index range owned by a thread of a process
    pub fn thread_range(&self, rank: Rank, thread: usize) -> Range<usize> {
        let offset = rank * self.values_per_process;
        let local = self.local_thread_range(thread);
        offset + local.start..offset + local.end
    }

    /// Iterate over every (rank, thread, global range) triple of a cluster, rank-major
    pub fn ranges(
        &self,
        process_count: usize,
    ) -> impl Iterator<Item = (Rank, usize, Range<usize>)> + '_ {
        iproduct!(0..process_count, 0..self.threads_per_process)
            .map(move |(rank, thread)| (rank, thread, self.thread_range(rank, thread)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_tiles(process_count: usize, threads: usize, values: usize) {
        let partition = Partition::new(threads, values).unwrap();
        let total = partition.total_count(process_count).unwrap();
        let mut covered = vec![0u8; total];
        let mut next = 0;
        for (rank, thread, range) in partition.ranges(process_count) {
            assert_eq!(range.start, next);
            assert_eq!(range.len(), values);
            let process = partition.process_range(rank);
            assert!(process.start <= range.start && range.end <= process.end);
            assert_eq!(
                range.start - process.start,
                partition.local_thread_range(thread).start
            );
            for i in range.clone() {
                covered[i] += 1;
            }
            next = range.end;
        }
        assert_eq!(next, total);
        assert!(covered.iter().all(|c| *c == 1));
    }

    #[test]
    fn test_partition_tiles_index_space() {
        for process_count in 1..5 {
            for threads in 0..5 {
                for values in 0..6 {
                    assert_tiles(process_count, threads, values);
                }
            }
        }
    }

    #[test]
    fn test_partition_ranges() {
        let partition = Partition::new(2, 3).unwrap();
        assert_eq!(partition.values_per_process(), 6);
        assert_eq!(partition.total_count(2).unwrap(), 12);
        assert_eq!(partition.process_range(1), 6..12);
        assert_eq!(partition.local_thread_range(1), 3..6);
        assert_eq!(partition.thread_range(1, 0), 6..9);
        assert_eq!(partition.thread_range(1, 1), 9..12);
    }

    #[test]
    fn test_degenerate_partitions() {
        let no_threads = Partition::new(0, 7).unwrap();
        assert_eq!(no_threads.total_count(3).unwrap(), 0);
        assert_eq!(no_threads.ranges(3).count(), 0);
        assert!(no_threads.process_range(2).is_empty());

        let no_values = Partition::new(4, 0).unwrap();
        assert_eq!(no_values.total_count(3).unwrap(), 0);
        assert!(no_values.ranges(3).all(|(_, _, r)| r.is_empty()));
    }

    #[test]
    fn test_partition_overflow() {
        assert!(matches!(
            Partition::new(usize::MAX, 2),
            Err(Error::PartitionOverflow { .. })
        ));
        let partition = Partition::new(1 << 20, 1 << 20).unwrap();
        assert!(partition.total_count(usize::MAX).is_err());
    }
}
