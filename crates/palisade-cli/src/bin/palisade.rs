use std::process::ExitCode;

use clap::Parser;

use palisade_cli::args::{CliArgs, Command};
use palisade_cli::{driver, tracing_config};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    tracing_config::init(args.verbose);

    let result = match &args.command {
        Command::Compile { path } => driver::compile(path, !args.no_color),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
