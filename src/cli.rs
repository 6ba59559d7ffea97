use clap::{ArgAction, Parser, Subcommand};
use indexer_extract::SourceKind;
use std::path::PathBuf;

/// Mirror canvas, image and PDF attachments of a notes vault into generated
/// Markdown index pages.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON), layered over the user configuration.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Vault root directory, overriding the configured one.
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Go through the motions without writing or deleting anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// More logging (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less logging (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Log as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}
impl Cli {
    /// Net verbosity: positive is chattier, negative quieter.
    pub fn verbosity(&self) -> i8 {
        self.verbose.min(i8::MAX as u8) as i8 - self.quiet.min(i8::MAX as u8) as i8
    }
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Bring every index page up to date.
    Run {
        /// Only handle these kinds (repeatable). Defaults to every configured kind.
        #[arg(long = "kind", value_name = "KIND")]
        kinds: Vec<SourceKind>,
    },
    /// Print the configured mappings.
    Kinds,
}
