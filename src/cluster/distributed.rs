//! MPI-backed cluster
use crate::traits::Cluster;
use crate::types::{
    ClusterIdentity, Error, Rank, Result, RunningTotal, Tag, ThreadSupport, COORDINATOR,
};
use log::debug;
use mpi::{
    collective::SystemOperation,
    environment::Universe,
    point_to_point::{Destination, Source},
    topology::{Communicator, SimpleCommunicator},
    traits::{CommunicatorCollectives, Root},
    Threading,
};

impl From<Threading> for ThreadSupport {
    fn from(threading: Threading) -> Self {
        match threading {
            Threading::Single => ThreadSupport::Single,
            Threading::Funneled => ThreadSupport::Funneled,
            Threading::Serialized => ThreadSupport::Serialized,
            Threading::Multiple => ThreadSupport::Multiple,
        }
    }
}

impl From<ThreadSupport> for Threading {
    fn from(support: ThreadSupport) -> Self {
        match support {
            ThreadSupport::Single => Threading::Single,
            ThreadSupport::Funneled => Threading::Funneled,
            ThreadSupport::Serialized => Threading::Serialized,
            ThreadSupport::Multiple => Threading::Multiple,
        }
    }
}

/// An MPI session over `MPI_COMM_WORLD`.
///
/// Owns the MPI environment: MPI is initialised when the session is created and
/// finalised when it is dropped, on every exit path.
pub struct MpiSession {
    world: SimpleCommunicator,
    identity: ClusterIdentity,
    // Dropped last, after the communicator
    _universe: Universe,
}

impl MpiSession {
    /// Initialise MPI, requesting the given thread support
    pub fn initialize(requested: ThreadSupport) -> Result<Self> {
        let (universe, provided) = mpi::initialize_with_threading(requested.into())
            .ok_or_else(|| Error::Runtime("MPI has already been initialised".to_string()))?;
        let world = universe.world();
        let identity = ClusterIdentity {
            rank: world.rank() as Rank,
            size: world.size() as usize,
            thread_support: provided.into(),
        };
        debug!(
            "MPI initialised on rank {} of {} with {:?} thread support",
            identity.rank, identity.size, identity.thread_support
        );
        Ok(Self {
            world,
            identity,
            _universe: universe,
        })
    }

    /// The world communicator
    pub fn world(&self) -> &SimpleCommunicator {
        &self.world
    }

    fn check_rank(&self, rank: Rank) -> Result<mpi::Rank> {
        if rank < self.identity.size {
            Ok(rank as mpi::Rank)
        } else {
            Err(Error::InvalidRank {
                rank,
                size: self.identity.size,
            })
        }
    }
}

impl Drop for MpiSession {
    fn drop(&mut self) {
        debug!("Finalising MPI on rank {}", self.identity.rank);
    }
}

impl Cluster for MpiSession {
    fn identity(&self) -> ClusterIdentity {
        self.identity
    }

    fn send(&self, values: &[u32], destination: Rank, tag: Tag) -> Result<()> {
        let destination = self.check_rank(destination)?;
        self.world
            .process_at_rank(destination)
            .send_with_tag(values, tag);
        Ok(())
    }

    fn receive(&self, len: usize, source: Rank, tag: Tag) -> Result<Vec<u32>> {
        let from_rank = source;
        let source = self.check_rank(source)?;
        let (values, _status) = self
            .world
            .process_at_rank(source)
            .receive_vec_with_tag::<u32>(tag);
        if values.len() != len {
            return Err(Error::ProtocolViolation {
                expected: len,
                received: values.len(),
                from_rank,
            });
        }
        Ok(values)
    }

    fn reduce_sum_to_coordinator(&self, local: RunningTotal) -> Result<Option<RunningTotal>> {
        let root = self.world.process_at_rank(COORDINATOR as mpi::Rank);
        let total = if self.identity.is_coordinator() {
            let mut total: RunningTotal = 0;
            root.reduce_into_root(&local, &mut total, SystemOperation::sum());
            Some(total)
        } else {
            root.reduce_into(&local, SystemOperation::sum());
            None
        };
        // A reduction need not synchronise every rank; the barrier makes it a full one
        self.world.barrier();
        Ok(total)
    }

    fn all_agree(&self, ok: bool) -> Result<bool> {
        let vote = i32::from(ok);
        let mut all = 0i32;
        self.world
            .all_reduce_into(&vote, &mut all, SystemOperation::min());
        Ok(all == 1)
    }
}
