use std::process;

use clap::Parser;
use cli::{Args, Command};
use error::LabelshedResult;
use log::LevelFilter;

pub(crate) mod prelude {
    pub(crate) use crate::config::Config;
    pub(crate) use crate::error::{
        bail, LabelshedError, LabelshedResult,
    };
    pub(crate) use crate::labelshed::Labelshed;
}

mod cli;
mod commands;
mod config;
mod error;
mod labelshed;
mod store;

fn init_logger(args: &Args) {
    let level = if args.verbose {
        LevelFilter::Info
    } else if args.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: Args) -> LabelshedResult<()> {
    match args.cmd {
        Command::Agreement(cmd) => cmd.execute(),
        Command::Annotate(cmd) => cmd.execute(),
        Command::Completions(cmd) => cmd.execute(),
        Command::Config(cmd) => cmd.execute(),
        Command::Convert(cmd) => cmd.execute(),
        Command::Export(cmd) => cmd.execute(),
        Command::Import(cmd) => cmd.execute(),
        Command::Init(cmd) => cmd.execute(),
        Command::Status(cmd) => cmd.execute(),
        Command::User(cmd) => cmd.execute(),
        Command::Version(cmd) => cmd.execute(),
    }
}

fn main() {
    let args = Args::parse();
    init_logger(&args);

    match run(args) {
        Ok(()) => process::exit(0),
        Err(e) if e.is_broken_pipe() => process::exit(0),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
