//! The command-line argument surface, declared with clap's derive API.
//!
//! clap rejects unknown commands and missing arguments itself, printing
//! usage and exiting with status 2.

use clap::Parser;
use std::path::PathBuf;

use crate::gen::Command;

/// Optgen is a tool for generating cost-based optimizers.
///
/// It compiles source files that use a custom syntax to define
/// expressions, match expression patterns, and generate replacement
/// expressions.
#[derive(Debug, Parser)]
#[command(
    name = "optgen",
    version,
    about = "Optgen is a tool for generating cost-based optimizers.",
    long_about = "Optgen is a tool for generating cost-based optimizers.\n\n\
        It compiles source files that use a custom syntax to define expressions,\n\
        match expression patterns, and generate replacement expressions."
)]
pub struct OptgenArgs {
    /// Output file name of generated code; defaults to the diagnostic stream
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// The artifact to produce
    #[arg(value_enum)]
    pub command: Command,

    /// Source file names and/or glob patterns
    #[arg(required = true)]
    pub sources: Vec<String>,
}
