//! CLI argument definitions.
//!
//! Subcommands and their implementations live in the `commands` module.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Command;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON config file (defaults to ./.cifkit.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log and skip recoverable syntax problems instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,

    #[command(subcommand)]
    pub command: Command,
}
