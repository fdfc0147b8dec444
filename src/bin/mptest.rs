//! Run the reduction check across an MPI job
//!
//! `mpirun -n 4 mptest 2 1000` scatters 4 x 2 x 1000 values over four
//! processes with two worker threads each.
use clap::Parser;
use log::error;
use mptest::cluster::MpiSession;
use mptest::run::parse_count;
use mptest::traits::Cluster;
use mptest::types::{Error, Result, ThreadSupport};
use mptest::verify::write_announcement;
use mptest::{run, RunConfig};
use std::io::Write;
use std::process::ExitCode;

/// Check a distributed, multi-threaded sum of deterministic random values
#[derive(Parser, Debug)]
#[command(name = "mptest", allow_negative_numbers = true)]
struct Cli {
    /// Worker threads on every process; negative values count as 0
    #[arg(value_parser = parse_count)]
    threads_per_process: usize,

    /// Values summed by each worker thread; negative values count as 0
    #[arg(value_parser = parse_count)]
    values_per_thread: usize,
}

/// Returns whether the totals agreed
fn execute(session: &MpiSession) -> Result<bool> {
    let mut stdout = std::io::stdout().lock();
    write_announcement(&session.identity(), &mut stdout)?;
    stdout.flush()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => return Err(Error::Usage(e.render().to_string())),
        Err(e) => {
            // --help and --version
            write!(stdout, "{}", e.render())?;
            return Ok(true);
        }
    };

    let config = RunConfig::new(cli.threads_per_process, cli.values_per_thread);
    let verification = run(session, &config, &mut stdout)?;
    stdout.flush()?;
    Ok(verification.map_or(true, |v| v.passed()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let session = match MpiSession::initialize(ThreadSupport::Funneled) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // The session is dropped, finalising MPI, after the exit code is chosen
    match execute(&session) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(Error::Usage(usage)) => {
            eprint!("{usage}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Rank {} failed", session.identity().rank);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
