mod app;
mod cli;
mod logging;

use crate::cli::{Cli, Command};
use clap::Parser;
use indexer_config::Config;
use indexer_extract::SourceKind;
use indexer_sync::error::ErrorKind as SyncErrorKind;
use std::process::ExitCode;

/// `EX_TEMPFAIL`: the content service is down, running again later may work.
const EXIT_TEMPFAIL: u8 = 75;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbosity(), cli.json);

    let config = match app::load_config(cli.config.as_deref(), cli.root.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "Could not load configuration");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        },
    };

    match cli.command {
        Some(Command::Kinds) => {
            print_kinds(&config);
            ExitCode::SUCCESS
        },
        Some(Command::Run { kinds }) => run(&config, cli.dry_run, &kinds).await,
        None if config.run_on_start => run(&config, cli.dry_run, &[]).await,
        None => {
            tracing::info!("Nothing to do: run_on_start is disabled and no command was given");
            ExitCode::SUCCESS
        },
    }
}

async fn run(config: &Config, dry_run: bool, kinds: &[SourceKind]) -> ExitCode {
    let indexer = match app::indexer(config, dry_run) {
        Ok(indexer) => indexer,
        Err(err) => {
            tracing::error!(error = ?err, "Could not start");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        },
    };
    if dry_run {
        tracing::info!("Dry run: nothing will be written or deleted");
    }

    match indexer.run_kinds(kinds).await {
        Ok(batch) => {
            print!("{batch}");
            ExitCode::SUCCESS
        },
        Err(err) if matches!(&*err, SyncErrorKind::Fatal) => {
            eprintln!("error: the content service is unavailable, try again later");
            ExitCode::from(EXIT_TEMPFAIL)
        },
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        },
    }
}

fn print_kinds(config: &Config) {
    let credential = config.api_key.is_some();
    for &kind in &config.kinds {
        let target = config.target_extension(kind).unwrap_or(kind.default_target_extension());
        let note = match kind.is_attachment() && !credential {
            true => " (skipped: no API key)",
            false => "",
        };
        println!("{kind}: {} -> {}/*{target}{note}", kind.source_extension(), config.index_folder.display());
    }
}
