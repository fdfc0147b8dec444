//! Trait definitions

mod cluster;

pub use cluster::Cluster;
