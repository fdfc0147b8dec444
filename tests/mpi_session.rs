#![cfg(feature = "mpi")]
use mptest::cluster::MpiSession;
use mptest::generate::generate;
use mptest::traits::Cluster;
use mptest::types::ThreadSupport;
use mptest::{run, RunConfig};

// MPI can be initialised once per process, so everything shares one test
#[test]
fn test_single_process_session() {
    let session = MpiSession::initialize(ThreadSupport::Funneled).unwrap();
    let identity = session.identity();
    assert_eq!(identity.rank, 0);
    assert_eq!(identity.size, 1);

    assert!(session.all_agree(true).unwrap());
    assert!(!session.all_agree(false).unwrap());
    assert_eq!(session.reduce_sum_to_coordinator(u64::MAX).unwrap(), Some(u64::MAX));

    if identity.thread_support >= ThreadSupport::Funneled {
        let mut out = Vec::new();
        let verification = run(&session, &RunConfig::new(2, 3), &mut out)
            .unwrap()
            .unwrap();
        assert!(verification.passed());
        assert_eq!(verification.actual, generate(6).expected_total);
    }

    assert!(MpiSession::initialize(ThreadSupport::Single).is_err());
}
