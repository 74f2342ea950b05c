mod app;
mod cli;
mod sink;

use app::App;
use clap::Parser;
use std::io;
use tracing_subscriber::{EnvFilter, fmt};

/// `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,abx_pilot=info,abx_experiment=info,abx_cache=info")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = cli::Args::parse();
    let app = App::new(args, io::stdin().lock(), io::stdout())?;
    app.run()
}
