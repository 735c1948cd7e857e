//! pdfstitch - Assemble one PDF from pages of many source files.
//!
//! Imports the given files, applies editing commands from a script or
//! stdin, and saves the merged result.

mod cli;
mod shell;

use clap::Parser;
use std::path::Path;
use std::process;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::shell::{Shell, confirm_overwrite};
use pdfstitch::config::Config;
use pdfstitch::error::StitchError;
use pdfstitch::output::{
    OutputFormatter, display_import_report, display_listing, display_merge_statistics,
};
use pdfstitch::session::Session;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pdfstitch=debug"
    } else {
        "pdfstitch=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), StitchError> {
    let config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);
    let mut session = Session::from_config(&config);

    if !config.inputs.is_empty() {
        formatter.debug(&format!("Importing {} file(s)...", config.inputs.len()));
        let report = session.add_files(&config.inputs).await?;
        display_import_report(&formatter, &report);
    }

    if let Some(script) = &config.script {
        run_script(&mut session, &formatter, &config, script).await?;
    }

    match &config.output {
        Some(output) => save(&session, &formatter, &config, output).await,
        None => {
            if config.script.is_none() {
                display_listing(&formatter, &session);
            }
            Ok(())
        }
    }
}

async fn run_script(
    session: &mut Session,
    formatter: &OutputFormatter,
    config: &Config,
    script: &Path,
) -> Result<(), StitchError> {
    let mut shell = Shell::new(session, formatter, config.overwrite_mode);

    let result = if script.as_os_str() == "-" {
        shell.run(BufReader::new(tokio::io::stdin())).await
    } else {
        let file = tokio::fs::File::open(script)
            .await
            .map_err(|_| StitchError::file_not_found(script.to_path_buf()))?;
        shell.run(BufReader::new(file)).await
    };
    result.map_err(|e| StitchError::other(format!("{e:#}")))?;

    if shell.failures() > 0 {
        formatter.warning(&format!("{} command(s) failed", shell.failures()));
    }
    Ok(())
}

async fn save(
    session: &Session,
    formatter: &OutputFormatter,
    config: &Config,
    output: &Path,
) -> Result<(), StitchError> {
    confirm_overwrite(output, config.overwrite_mode, formatter)?;
    let stats = session.merge_to_path(output).await?;
    display_merge_statistics(formatter, &stats, output);
    Ok(())
}
