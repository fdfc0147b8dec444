//! Types shared across the harness

/// Unsigned 64-bit accumulator used at thread, process and cluster level.
///
/// Totals are combined with wrapping addition, so they are exact modulo 2^64.
pub type RunningTotal = u64;

/// Zero-based rank of a process within the cluster
pub type Rank = usize;

/// Message tag for point-to-point transfers
pub type Tag = i32;

/// Rank of the process that generates, distributes and verifies the data
pub const COORDINATOR: Rank = 0;

/// Capability tier of the communication runtime with respect to threads.
///
/// Ordered from least to most permissive, matching the MPI threading levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreadSupport {
    /// Only one thread exists in the process
    Single,
    /// Threads may exist, but only the main thread communicates
    Funneled,
    /// Any thread communicates, one at a time
    Serialized,
    /// Any thread communicates at any time
    Multiple,
}

/// Identity of a process, fixed for the lifetime of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterIdentity {
    /// Rank of this process
    pub rank: Rank,
    /// Number of processes in the cluster
    pub size: usize,
    /// Thread support provided by the runtime
    pub thread_support: ThreadSupport,
}

impl ClusterIdentity {
    /// Is this process the coordinator?
    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }
}

/// Error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wrong command line
    #[error("{0}")]
    Usage(String),
    /// The runtime cannot host the requested number of threads
    #[error(
        "Communication runtime does not support multiple threads: \
         {threads} threads per process need {required:?}, runtime provides {provided:?}"
    )]
    Capability {
        /// Requested threads per process
        threads: usize,
        /// Required thread support
        required: ThreadSupport,
        /// Thread support provided by the runtime
        provided: ThreadSupport,
    },
    /// Another process voted to abort the run
    #[error("Run aborted: another process could not start")]
    PeerAborted,
    /// A transfer did not carry the agreed number of values
    #[error(
        "Protocol violation: expected {expected} values from rank {from_rank}, received {received}"
    )]
    ProtocolViolation {
        /// Agreed length
        expected: usize,
        /// Length actually received
        received: usize,
        /// Sending rank
        from_rank: Rank,
    },
    /// A local buffer does not match its partition
    #[error("Buffer holds {actual} values but the partition assigns {expected}")]
    BufferLength {
        /// Values assigned by the partition
        expected: usize,
        /// Values in the buffer
        actual: usize,
    },
    /// A reducer was handed a partition with a different thread count
    #[error("Partition has {partition} threads per process but the reducer runs {workers}")]
    ThreadCount {
        /// Threads per process in the partition
        partition: usize,
        /// Workers in the reducer
        workers: usize,
    },
    /// The index space cannot be represented
    #[error("Partition of {processes} x {threads} x {values} values overflows the index space")]
    PartitionOverflow {
        /// Process count
        processes: usize,
        /// Threads per process
        threads: usize,
        /// Values per thread
        values: usize,
    },
    /// A rank outside the cluster was addressed
    #[error("Rank {rank} is outside a cluster of size {size}")]
    InvalidRank {
        /// Requested rank
        rank: Rank,
        /// Cluster size
        size: usize,
    },
    /// A peer went away mid-run
    #[error("Lost connection to rank {0}")]
    Disconnected(Rank),
    /// The coordinator did not receive the grand total
    #[error("Collective reduction did not deliver a total to the coordinator")]
    MissingTotal,
    /// The communication runtime could not be started
    #[error("Communication runtime unavailable: {0}")]
    Runtime(String),
    /// The worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// Writing the report failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
