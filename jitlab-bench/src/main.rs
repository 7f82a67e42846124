use clap::Parser;
use jitlab_bench::config::{Args, RunConfig};
use jitlab_bench::{driver, report};
use jitlab_common::BenchError;
use std::io::Write;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries only the CSV report; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(csv) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(csv.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("error: failed to write report: {e}");
                process::exit(3);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(exit_code(&e));
        }
    }
}

fn run(args: &Args) -> Result<String, BenchError> {
    let config = RunConfig::from_args(args)?;
    let result = driver::run(&config)?;
    Ok(report::format(&config, &result))
}

fn exit_code(e: &BenchError) -> i32 {
    if e.is_configuration() {
        2
    } else {
        3
    }
}
