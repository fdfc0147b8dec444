//! mptest
//!
//! Verification harness for a two-level parallel reduction. A deterministic
//! value set is scattered from the coordinator across a cluster of processes,
//! every process sums its share with a pool of worker threads, and the
//! process totals are combined at the coordinator and checked against the
//! total computed while generating the values.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod cluster;
pub mod collective;
pub mod generate;
pub mod partition;
pub mod reduce;
pub mod run;
pub mod traits;
pub mod transport;
pub mod types;
pub mod verify;

pub use run::{run, RunConfig};
