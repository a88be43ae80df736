//! doctools CLI — documentation build helpers.
//!
//! Converts Markdown to HTML with a generated index page, screens new
//! issues/PRs for spam, and provides portable file operations for build
//! scripts.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
