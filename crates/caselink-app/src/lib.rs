#![warn(missing_docs)]
//! # caselink-app
//!
//! ## Purpose
//! Orchestrates link validation, upload, findings, report, and UI state for
//! one patient dashboard session.
//!
//! ## Responsibilities
//! - Gate the dashboard on access-link validity.
//! - Drive the phase machine `ValidatingLink -> InvalidLink | AwaitingUpload
//!   -> Processing -> AwaitingUpload | ResultsReady`.
//! - Trigger findings and report fetches exactly once after a successful
//!   upload.
//! - Load runtime configuration ([`AppConfig`]).
//!
//! ## Data flow
//! Route -> link validation -> file selection + disclaimer -> multipart
//! upload -> findings/report queries -> [`caselink_ui::DashboardView`] ->
//! rendered text.
//!
//! ## Ownership and lifetimes
//! [`Dashboard`] owns all session state; nothing is global, and separate
//! sessions never share state.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]. User-visible failures
//! also leave a localized toast on the view.
//!
//! ## Security and privacy notes
//! - Link ids are logged masked.
//! - Upload and report bytes are never logged.

mod config;
mod controller;

use std::path::PathBuf;

use caselink_access::AccessError;
use caselink_api::ApiError;
use caselink_findings::FetchError;
use caselink_ui::{CatalogError, DashboardPhase};
use caselink_upload::{SelectionError, UploadError};
use thiserror::Error;

pub use config::{AppConfig, ConfigError, LOCALE_ENV, LOCALES_DIR_ENV, MAX_UPLOAD_BYTES_ENV};
pub use controller::Dashboard;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("CASELINK_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Translation tables could not be loaded.
    #[error("locale error: {0}")]
    Catalog(#[from] CatalogError),
    /// HTTP client error.
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    /// Link validation task error.
    #[error("access error: {0}")]
    Access(#[from] AccessError),
    /// Selection not ready for submission.
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    /// Upload refused or failed.
    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
    /// Findings or report retrieval failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// Submission attempted outside the upload phase.
    #[error("uploads are not accepted in phase {0:?}")]
    UploadRefused(DashboardPhase),
    /// No report URL is known yet.
    #[error("report is not available")]
    ReportUnavailable,
    /// Local file could not be read or written.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}
