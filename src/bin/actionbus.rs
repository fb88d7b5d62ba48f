//! Runs the assistant with the default topology.
//!
//! Type `help` for commands; `shutdown`, Ctrl-C or `SIGTERM` run the
//! shutdown handshake. Log output goes to stderr, filtered by `RUST_LOG`
//! unless `--debug` or `--verbose` is given.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actionbus::{
    default_topology, Config, DispatchReport, LogWriter, Runtime, RuntimeError, Subscribe,
};
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "actionbus")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging (includes every routed envelope)
    #[arg(short, long)]
    debug: bool,

    /// Enable info logging
    #[arg(short, long)]
    verbose: bool,

    /// Component table read at boot and on RELOAD
    #[arg(long, value_name = "PATH", default_value = "resources/componentList.txt")]
    table: PathBuf,

    /// Bounces allowed per envelope before it is dropped (0 = unlimited)
    #[arg(long, default_value_t = 8)]
    max_bounces: u32,

    /// Bounce unknown verbs instead of ignoring them
    #[arg(long)]
    strict_verbs: bool,

    /// Seconds workers get to stop after the dispatcher exits
    #[arg(long, default_value_t = 5)]
    grace_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();

    let cfg = Config {
        component_table: args.table,
        max_bounces: args.max_bounces,
        strict_verbs: args.strict_verbs,
        grace: Duration::from_secs(args.grace_secs),
        ..Config::default()
    };

    let builder = Runtime::builder(cfg);
    let topology = default_topology(&builder);
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runtime = builder
        .with_subscribers(subscribers)
        .with_topology(topology)
        .build();

    println!("actionbus v{}; type help for commands", env!("CARGO_PKG_VERSION"));
    let code = exit_code(runtime.run().await);

    // stdin is read on a blocking thread that only returns after the next
    // line; leave without waiting for it.
    std::process::exit(code);
}

/// Logs how the run ended and picks the process exit code.
fn exit_code(result: Result<DispatchReport, RuntimeError>) -> i32 {
    match result {
        Ok(report) => {
            info!(
                dispatched = report.dispatched,
                delivered = report.delivered,
                bounced = report.bounced,
                dropped = report.dropped,
                "bye"
            );
            0
        }
        Err(e) => {
            error!(label = e.as_label(), "{}", e.as_message());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(Ok(DispatchReport::default())), 0);

        let stuck = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(5),
            stuck: vec!["terminal-input".into()],
        };
        assert_eq!(exit_code(Err(stuck)), 1);
    }
}
