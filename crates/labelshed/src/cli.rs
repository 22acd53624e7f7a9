use clap::{Parser, Subcommand};

use crate::commands::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; only report errors. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Agreement(Agreement),
    Annotate(Annotate),
    Completions(Completions),
    Config(Config),
    Convert(Convert),
    Export(Export),
    Import(Import),
    #[clap(alias = "new")]
    Init(Init),
    Status(Status),
    User(User),
    Version(Version),
}
