//! In-process cluster: one OS thread per rank, connected by channels
use crate::traits::Cluster;
use crate::types::{
    ClusterIdentity, Error, Rank, Result, RunningTotal, Tag, ThreadSupport, COORDINATOR,
};
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

#[derive(Debug)]
enum Message {
    Data { tag: Tag, values: Vec<u32> },
    Total(RunningTotal),
    Release,
    Vote(bool),
    Verdict(bool),
}

/// A cluster of `size` ranks living in a single process.
///
/// Every ordered pair of ranks is joined by an unbounded channel, so sends
/// complete immediately and receives block until a matching message arrives.
/// Messages that arrive out of order are parked until asked for.
pub struct LocalCluster {
    size: usize,
    thread_support: ThreadSupport,
}

impl LocalCluster {
    /// Create a cluster description
    pub fn new(size: usize, thread_support: ThreadSupport) -> Self {
        Self {
            size,
            thread_support,
        }
    }

    /// Build the endpoints, one per rank
    pub fn endpoints(&self) -> Vec<LocalEndpoint> {
        let mut outboxes: Vec<Vec<Sender<Message>>> = (0..self.size)
            .map(|_| Vec::with_capacity(self.size))
            .collect();
        let mut inboxes: Vec<Vec<Receiver<Message>>> = (0..self.size)
            .map(|_| Vec::with_capacity(self.size))
            .collect();
        for outbox in outboxes.iter_mut() {
            for inbox in inboxes.iter_mut() {
                let (tx, rx) = channel();
                outbox.push(tx);
                inbox.push(rx);
            }
        }
        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalEndpoint {
                identity: ClusterIdentity {
                    rank,
                    size: self.size,
                    thread_support: self.thread_support,
                },
                parked: RefCell::new((0..inboxes.len()).map(|_| VecDeque::new()).collect()),
                outboxes,
                inboxes,
            })
            .collect()
    }

    /// Run `f` on every rank concurrently and collect the results in rank order.
    ///
    /// A panic on any rank is propagated to the caller. If a rank thread cannot
    /// be spawned, the endpoints not yet handed out are dropped so the running
    /// ranks see their peers disconnect instead of blocking.
    pub fn run<F, R>(&self, f: F) -> Result<Vec<R>>
    where
        F: Fn(LocalEndpoint) -> R + Sync,
        R: Send,
    {
        let endpoints = self.endpoints();
        let f = &f;
        thread::scope(|scope| {
            let handles = endpoints
                .into_iter()
                .map(|endpoint| {
                    thread::Builder::new()
                        .name(format!("rank-{}", endpoint.identity.rank))
                        .spawn_scoped(scope, move || f(endpoint))
                })
                .collect::<std::io::Result<Vec<_>>>()?;
            Ok(handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect())
        })
    }
}

/// One rank of a [`LocalCluster`]
pub struct LocalEndpoint {
    identity: ClusterIdentity,
    // outboxes[d] delivers to rank d; inboxes[s] holds messages from rank s
    outboxes: Vec<Sender<Message>>,
    inboxes: Vec<Receiver<Message>>,
    parked: RefCell<Vec<VecDeque<Message>>>,
}

impl LocalEndpoint {
    fn check_rank(&self, rank: Rank) -> Result<()> {
        if rank < self.identity.size {
            Ok(())
        } else {
            Err(Error::InvalidRank {
                rank,
                size: self.identity.size,
            })
        }
    }

    fn post(&self, destination: Rank, message: Message) -> Result<()> {
        self.check_rank(destination)?;
        self.outboxes[destination]
            .send(message)
            .map_err(|_| Error::Disconnected(destination))
    }

    /// Take the first message from `source` accepted by `matches`
    fn take<F>(&self, source: Rank, matches: F) -> Result<Message>
    where
        F: Fn(&Message) -> bool,
    {
        self.check_rank(source)?;
        {
            let mut parked = self.parked.borrow_mut();
            let queue = &mut parked[source];
            if let Some(position) = queue.iter().position(&matches) {
                if let Some(message) = queue.remove(position) {
                    return Ok(message);
                }
            }
        }
        loop {
            let message = self.inboxes[source]
                .recv()
                .map_err(|_| Error::Disconnected(source))?;
            if matches(&message) {
                return Ok(message);
            }
            self.parked.borrow_mut()[source].push_back(message);
        }
    }
}

impl Cluster for LocalEndpoint {
    fn identity(&self) -> ClusterIdentity {
        self.identity
    }

    fn send(&self, values: &[u32], destination: Rank, tag: Tag) -> Result<()> {
        debug!(
            "Rank {} sending {} values to rank {destination}",
            self.identity.rank,
            values.len()
        );
        self.post(
            destination,
            Message::Data {
                tag,
                values: values.to_vec(),
            },
        )
    }

    fn receive(&self, len: usize, source: Rank, tag: Tag) -> Result<Vec<u32>> {
        let message = self.take(source, |m| {
            matches!(m, Message::Data { tag: t, .. } if *t == tag)
        })?;
        let Message::Data { values, .. } = message else {
            unreachable!("take only returns matching messages");
        };
        if values.len() != len {
            return Err(Error::ProtocolViolation {
                expected: len,
                received: values.len(),
                from_rank: source,
            });
        }
        Ok(values)
    }

    fn reduce_sum_to_coordinator(&self, local: RunningTotal) -> Result<Option<RunningTotal>> {
        if self.identity.is_coordinator() {
            let mut total = local;
            for source in 1..self.identity.size {
                if let Message::Total(value) =
                    self.take(source, |m| matches!(m, Message::Total(_)))?
                {
                    total = total.wrapping_add(value);
                }
            }
            for destination in 1..self.identity.size {
                self.post(destination, Message::Release)?;
            }
            Ok(Some(total))
        } else {
            self.post(COORDINATOR, Message::Total(local))?;
            self.take(COORDINATOR, |m| matches!(m, Message::Release))?;
            Ok(None)
        }
    }

    fn all_agree(&self, ok: bool) -> Result<bool> {
        if self.identity.is_coordinator() {
            let mut all = ok;
            for source in 1..self.identity.size {
                if let Message::Vote(vote) =
                    self.take(source, |m| matches!(m, Message::Vote(_)))?
                {
                    all &= vote;
                }
            }
            for destination in 1..self.identity.size {
                self.post(destination, Message::Verdict(all))?;
            }
            Ok(all)
        } else {
            self.post(COORDINATOR, Message::Vote(ok))?;
            match self.take(COORDINATOR, |m| matches!(m, Message::Verdict(_)))? {
                Message::Verdict(all) => Ok(all),
                _ => Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identities() {
        let cluster = LocalCluster::new(3, ThreadSupport::Funneled);
        let identities = cluster.run(|endpoint| endpoint.identity()).unwrap();
        for (rank, identity) in identities.iter().enumerate() {
            assert_eq!(identity.rank, rank);
            assert_eq!(identity.size, 3);
            assert_eq!(identity.thread_support, ThreadSupport::Funneled);
        }
    }

    #[test]
    fn test_point_to_point() {
        let cluster = LocalCluster::new(2, ThreadSupport::Multiple);
        let received = cluster.run(|endpoint| {
            if endpoint.identity().rank == 0 {
                endpoint.send(&[4, 5, 6], 1, 7).unwrap();
                endpoint.send(&[1, 2], 1, 3).unwrap();
                None
            } else {
                // Ask for the later tag first to exercise parking
                let b = endpoint.receive(2, 0, 3).unwrap();
                let a = endpoint.receive(3, 0, 7).unwrap();
                Some((a, b))
            }
        })
        .unwrap();
        assert_eq!(received[1], Some((vec![4, 5, 6], vec![1, 2])));
    }

    #[test]
    fn test_length_mismatch() {
        let cluster = LocalCluster::new(2, ThreadSupport::Multiple);
        let results = cluster.run(|endpoint| {
            if endpoint.identity().rank == 0 {
                endpoint.send(&[1, 2, 3], 1, 0).map(|_| ())
            } else {
                endpoint.receive(4, 0, 0).map(|_| ())
            }
        })
        .unwrap();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(Error::ProtocolViolation {
                expected: 4,
                received: 3,
                from_rank: 0
            })
        ));
    }

    #[test]
    fn test_reduce_to_coordinator() {
        let cluster = LocalCluster::new(4, ThreadSupport::Multiple);
        let totals = cluster.run(|endpoint| {
            let local = if endpoint.identity().rank == 1 {
                u64::MAX
            } else {
                endpoint.identity().rank as u64
            };
            endpoint.reduce_sum_to_coordinator(local).unwrap()
        })
        .unwrap();
        // 0 + MAX + 2 + 3 wraps to 4
        assert_eq!(totals, vec![Some(4), None, None, None]);
    }

    #[test]
    fn test_all_agree() {
        let cluster = LocalCluster::new(3, ThreadSupport::Multiple);
        let verdicts = cluster
            .run(|endpoint| endpoint.all_agree(true).unwrap())
            .unwrap();
        assert_eq!(verdicts, vec![true; 3]);
        let verdicts = cluster.run(|endpoint| {
            let rank = endpoint.identity().rank;
            endpoint.all_agree(rank != 2).unwrap()
        })
        .unwrap();
        assert_eq!(verdicts, vec![false; 3]);
    }

    #[test]
    fn test_invalid_rank() {
        let cluster = LocalCluster::new(1, ThreadSupport::Single);
        let results = cluster.run(|endpoint| endpoint.send(&[1], 5, 0)).unwrap();
        assert!(matches!(
            results[0],
            Err(Error::InvalidRank { rank: 5, size: 1 })
        ));
    }

    #[test]
    fn test_disconnected_peer() {
        let cluster = LocalCluster::new(2, ThreadSupport::Multiple);
        let results = cluster.run(|endpoint| {
            if endpoint.identity().rank == 0 {
                endpoint.receive(1, 1, 0).map(|_| ())
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert!(matches!(results[0], Err(Error::Disconnected(1))));
    }
}
