#![warn(missing_docs)]
//! # caselink binary
//!
//! Terminal front end that drives one patient dashboard session.

use std::path::PathBuf;
use std::process::ExitCode;

use caselink_access::link_id_from_route;
use caselink_api::BASE_URL_ENV;
use caselink_app::{AppConfig, AppError, Dashboard, LOCALE_ENV, LOCALES_DIR_ENV, app_version};
use caselink_upload::SelectedFile;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Patient dashboard client.
#[derive(Debug, Parser)]
#[command(name = "caselink", version = app_version(), about = "Patient dashboard client")]
struct Cli {
    /// Access link: bare id, `/dashboard/{id}` route, or full URL.
    link: String,

    /// Document to upload; repeat for several files.
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Acknowledge that AI findings are not a medical diagnosis.
    #[arg(long)]
    accept_disclaimer: bool,

    /// UI language (`en`, `id`).
    #[arg(long, env = LOCALE_ENV)]
    lng: Option<String>,

    /// Directory holding `{lng}/{namespace}.json` translation tables.
    #[arg(long, env = LOCALES_DIR_ENV)]
    locales_dir: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long, env = BASE_URL_ENV)]
    api_base_url: Option<String>,

    /// Where to save the report once it is available.
    #[arg(long, value_name = "PATH")]
    report_out: Option<PathBuf>,
}

impl Cli {
    /// Config values supplied on the command line.
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(url) = &self.api_base_url {
            pairs.push((BASE_URL_ENV, url.clone()));
        }
        if let Some(lng) = &self.lng {
            pairs.push((LOCALE_ENV, lng.clone()));
        }
        if let Some(dir) = &self.locales_dir {
            pairs.push((LOCALES_DIR_ENV, dir.display().to_string()));
        }
        pairs
    }
}

/// Session outcome mapped to a process exit code.
enum Outcome {
    Completed,
    InvalidLink,
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::InvalidLink => ExitCode::from(2),
            Outcome::Failed => ExitCode::from(1),
        }
    }
}

/// CLI entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("caselink=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(outcome) => outcome.into(),
        Err(run_error) => {
            error!(error = %run_error, "caselink session aborted");
            eprintln!("Error: {run_error}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome, AppError> {
    let overrides = cli.overrides();
    let config = AppConfig::from_lookup(|key| {
        overrides
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
            .or_else(|| std::env::var(key).ok())
    })?;
    info!(version = app_version(), base_url = %config.api.base_url, locale = config.locale.code(), "caselink starting");

    let mut dashboard = Dashboard::connect(&config)?;
    let link_valid = dashboard.open(link_id_from_route(&cli.link)).await?.is_valid();
    if !link_valid {
        println!("{}", dashboard.render());
        return Ok(Outcome::InvalidLink);
    }

    if cli.files.is_empty() {
        println!("{}", dashboard.render());
        return Ok(Outcome::Completed);
    }

    let mut batch = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = SelectedFile::from_path(path)
            .await
            .map_err(|source| AppError::Io {
                path: path.clone(),
                source,
            })?;
        batch.push(file);
    }
    dashboard.add_files(batch);
    dashboard.set_disclaimer_accepted(cli.accept_disclaimer);

    let submission = match dashboard.begin_submit() {
        Ok(submission) => submission,
        Err(submit_error) => {
            error!(error = %submit_error, "submission refused");
            println!("{}", dashboard.render());
            return Ok(Outcome::Failed);
        }
    };
    println!("{}", dashboard.render());

    let mut outcome = match dashboard.finish_submit(submission).await {
        Ok(_) if dashboard.view().shows_results() => Outcome::Completed,
        Ok(_) => Outcome::Failed,
        Err(submit_error) => {
            error!(error = %submit_error, "submission did not complete");
            Outcome::Failed
        }
    };

    if let Some(destination) = &cli.report_out
        && dashboard.view().report.data().is_some()
        && let Err(download_error) = dashboard.download_report(destination).await
    {
        error!(error = %download_error, "report was not saved");
        outcome = Outcome::Failed;
    }

    println!("{}", dashboard.render());
    Ok(outcome)
}
