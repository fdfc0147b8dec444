//! Intra-process reduction over a pool of worker threads
use crate::partition::Partition;
use crate::types::{Error, Result, RunningTotal};
use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Wrapping sum of a slice of values
pub fn wrapping_total(values: &[u32]) -> RunningTotal {
    values
        .iter()
        .fold(0, |acc: RunningTotal, v| acc.wrapping_add(u64::from(*v)))
}

/// Fork-join reducer with one worker per partition thread.
///
/// Each worker owns exactly one sub-range of the process buffer; partial sums
/// meet only in the final wrapping combine, so the result does not depend on
/// scheduling order.
pub struct ThreadedReducer {
    threads: usize,
    pool: Option<ThreadPool>,
}

impl ThreadedReducer {
    /// Create a reducer running `threads` workers.
    ///
    /// With zero threads no pool is created and every reduction is empty.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = if threads == 0 {
            None
        } else {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|index| format!("mptest-worker-{index}"))
                    .build()?,
            )
        };
        Ok(Self { threads, pool })
    }

    /// Number of workers
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `worker(t)` for every thread index `t` concurrently and combine the results
    pub fn fan_out<F>(&self, worker: F) -> RunningTotal
    where
        F: Fn(usize) -> RunningTotal + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                (0..self.threads)
                    .into_par_iter()
                    .map(&worker)
                    .reduce(|| 0, RunningTotal::wrapping_add)
            }),
            None => 0,
        }
    }

    /// Sum a process buffer laid out according to `partition`
    pub fn sum(&self, partition: &Partition, buffer: &[u32]) -> Result<RunningTotal> {
        if buffer.len() != partition.values_per_process() {
            return Err(Error::BufferLength {
                expected: partition.values_per_process(),
                actual: buffer.len(),
            });
        }
        if partition.threads_per_process() != self.threads {
            return Err(Error::ThreadCount {
                partition: partition.threads_per_process(),
                workers: self.threads,
            });
        }
        let total = self.fan_out(|thread| {
            let partial = wrapping_total(&buffer[partition.local_thread_range(thread)]);
            debug!("Thread {thread} partial sum {partial}");
            partial
        });
        Ok(total)
    }
}
