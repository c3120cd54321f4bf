use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for the `palisade` binary.
#[derive(Parser, Debug)]
#[command(name = "palisade", version, about = "The Palisade information-flow compiler")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Disable ANSI-coloured diagnostics.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a single `.pls` source file.
    Compile {
        /// Path to the source file.
        path: PathBuf,
    },
}
