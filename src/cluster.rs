//! Implementations of the communication substrate
#[cfg(feature = "mpi")]
mod distributed;
mod local;

#[cfg(feature = "mpi")]
pub use distributed::MpiSession;
pub use local::{LocalCluster, LocalEndpoint};
