//! Run the reduction check on a cluster simulated with threads
//!
//! `cargo run --example local_cluster -- 4 2 1000` runs four ranks with two
//! worker threads each and 1000 values per thread.
use mptest::cluster::LocalCluster;
use mptest::run::parse_count;
use mptest::traits::Cluster;
use mptest::types::ThreadSupport;
use mptest::verify::write_announcement;
use mptest::{run, RunConfig};

fn main() {
    env_logger::init();

    let args = std::env::args()
        .skip(1)
        .map(|a| parse_count(&a).unwrap())
        .collect::<Vec<_>>();
    let (processes, threads, values) = match args[..] {
        [p, t, v] => (p, t, v),
        [] => (4, 2, 1000),
        _ => panic!("Usage: local_cluster processes threads_per_process values_per_thread"),
    };

    let config = RunConfig::new(threads, values);
    let cluster = LocalCluster::new(processes, ThreadSupport::Funneled);
    let outputs = cluster
        .run(|endpoint| {
            let mut out = Vec::new();
            write_announcement(&endpoint.identity(), &mut out).unwrap();
            let verification = run(&endpoint, &config, &mut out).unwrap();
            (out, verification)
        })
        .unwrap();

    for (out, verification) in outputs {
        print!("{}", String::from_utf8_lossy(&out));
        if let Some(verification) = verification {
            assert!(verification.passed());
        }
    }
}
