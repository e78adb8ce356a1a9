use clap::{ArgAction, Parser, Subcommand};

use crate::check::{CheckArgs, run_check};
use crate::error::Result;
use crate::interactive::{InteractiveArgs, run_interactive};
use crate::logging;
use crate::replay::{ReplayArgs, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "vform-demo",
    about = "Drive vform sign-up sessions from scripts, flags or stdin",
    version
)]
pub struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a timed typing script on a virtual clock.
    Replay(ReplayArgs),

    /// Validate one username/password pair; exits 2 if the form is invalid.
    Check(CheckArgs),

    /// Type into a live session from stdin.
    Interactive(InteractiveArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    if !logging::init(cli.verbose) {
        tracing::debug!("log subscriber already installed; keeping it");
    }
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(args),
        Commands::Check(args) => run_check(args),
        Commands::Interactive(args) => run_interactive(args),
    }
}
