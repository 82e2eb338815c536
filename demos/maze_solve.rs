//! Step a maze search from the terminal.
//!
//! Run: cargo run --bin maze-solve -- demos/data/sample.txt --steps 10 --save state.mzr
//!
//! Logging is controlled by `MAZE_LOG` (e.g. `MAZE_LOG=debug`).

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use maze_demos::{CliArgs, RunConfig};

fn main() -> Result<()> {
    let env = env_logger::Env::new()
        .filter_or("MAZE_LOG", "warn")
        .write_style("MAZE_LOG_STYLE");
    env_logger::init_from_env(env);

    let config = RunConfig::from_args(CliArgs::parse())?;
    log::debug!("run config: {config:?}");

    let mut stdout = std::io::stdout().lock();
    let outcome = maze_demos::run(&config, &mut stdout)?;
    stdout.flush()?;
    std::process::exit(outcome.exit_code());
}
