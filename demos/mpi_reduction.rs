//? mpirun -n {{NPROCESSES}} --features "mpi"

#[cfg(feature = "mpi")]
fn test_mpi_reduction() {
    use mptest::cluster::MpiSession;
    use mptest::partition::Partition;
    use mptest::reduce::ThreadedReducer;
    use mptest::traits::Cluster;
    use mptest::types::ThreadSupport;
    use mptest::{collective, run, RunConfig};

    let session = MpiSession::initialize(ThreadSupport::Funneled).unwrap();
    let identity = session.identity();

    for (threads, values) in [(1, 0), (2, 3), (3, 1000), (0, 5)] {
        let config = RunConfig::new(threads, values);
        let mut out = Vec::new();
        let verification = run(&session, &config, &mut out).unwrap();
        if identity.is_coordinator() {
            let verification = verification.unwrap();
            assert!(verification.passed());
            if threads == 0 || values == 0 {
                assert_eq!(verification.actual, 0);
            }
        } else {
            assert!(verification.is_none());
            assert!(out.is_empty());
        }
    }

    // A rank without workers contributes nothing and does not hold up the others
    let partition = Partition::new(2, 4).unwrap();
    let buffer = vec![identity.rank as u32 + 1; 8];
    let local = if identity.rank == 1 {
        ThreadedReducer::new(0)
            .unwrap()
            .sum(&Partition::new(0, 4).unwrap(), &[])
            .unwrap()
    } else {
        ThreadedReducer::new(2).unwrap().sum(&partition, &buffer).unwrap()
    };
    let total = collective::combine_totals(&session, local).unwrap();
    if identity.is_coordinator() {
        let expected = (0..identity.size)
            .filter(|rank| *rank != 1)
            .map(|rank| 8 * (rank as u64 + 1))
            .sum::<u64>();
        assert_eq!(total, Some(expected));
    }
}

#[cfg(feature = "mpi")]
fn main() {
    test_mpi_reduction()
}

#[cfg(not(feature = "mpi"))]
fn main() {}
