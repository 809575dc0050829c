#![warn(missing_docs)]
//! # caselink-ui
//!
//! ## Purpose
//! Defines the dashboard view model and its text presentation.
//!
//! ## Responsibilities
//! - Represent dashboard phase, selected files, query states, and toasts
//!   ([`DashboardView`]).
//! - Decide which panels are visible in each phase.
//! - Load translation tables and pick the locale ([`Catalog`], [`Locale`]).
//! - Render panels as text, containing results-section failures behind a
//!   fallback ([`render_dashboard`]).
//!
//! ## Data flow
//! Controller events mutate [`DashboardView`] -> renderers read it together
//! with a [`Catalog`] -> text output.
//!
//! ## Ownership and lifetimes
//! `DashboardView` owns every value it displays so the controller can mutate
//! it between awaits without borrowing service state.
//!
//! ## Error model
//! Visibility is derived from state rather than guarded by errors. Rendering
//! the results section may fail with [`RenderError`], which the dashboard
//! renderer replaces with a contingency message.

mod catalog;
mod render;

use caselink_core::{Finding, ReportResponse};
use caselink_findings::{Query, viewer_targets};

pub use catalog::{Catalog, CatalogError, Locale, NAMESPACES};
pub use render::{
    DEFAULT_RESOURCES, ExternalResource, RenderError, format_size, render_dashboard,
    render_disclaimer, render_external_resources, render_findings_summary, render_image_viewer,
    render_report_preview, render_results, render_upload_panel,
};

/// Dashboard lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPhase {
    /// Link validity not yet resolved.
    ValidatingLink,
    /// Link rejected; terminal.
    InvalidLink,
    /// Upload panel shown.
    AwaitingUpload,
    /// Submission in flight.
    Processing,
    /// Upload succeeded; results shown until the session ends.
    ResultsReady,
}

/// One accepted file in the upload panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Positive confirmation.
    Success,
    /// Failure notice.
    Error,
}

/// Transient user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity.
    pub level: ToastLevel,
    /// Already-localized text.
    pub message: String,
}

/// Aggregate dashboard view state.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// App version shown in the footer.
    pub version: String,
    /// Current phase.
    pub phase: DashboardPhase,
    /// Reason the link was rejected, when known.
    pub link_error: Option<String>,
    /// Accepted files awaiting submission.
    pub files: Vec<FileEntry>,
    /// Disclaimer checkbox state.
    pub disclaimer_accepted: bool,
    /// Per-file size limit shown in the upload panel.
    pub max_file_size: u64,
    /// Findings query.
    pub findings: Query<Vec<Finding>>,
    /// Report query.
    pub report: Query<ReportResponse>,
    /// Notifications in arrival order.
    pub toasts: Vec<Toast>,
}

impl DashboardView {
    /// Creates the initial view: validating, nothing fetched.
    pub fn new(version: impl Into<String>, max_file_size: u64) -> Self {
        Self {
            version: version.into(),
            phase: DashboardPhase::ValidatingLink,
            link_error: None,
            files: Vec::new(),
            disclaimer_accepted: false,
            max_file_size,
            findings: Query::Idle,
            report: Query::Idle,
            toasts: Vec::new(),
        }
    }

    /// Loading indicator while the link is checked.
    pub fn shows_loading(&self) -> bool {
        self.phase == DashboardPhase::ValidatingLink
    }

    /// Blocking invalid-link notice.
    pub fn shows_invalid_notice(&self) -> bool {
        self.phase == DashboardPhase::InvalidLink
    }

    /// Upload panel: only before results exist.
    pub fn shows_upload_widget(&self) -> bool {
        self.phase == DashboardPhase::AwaitingUpload && self.findings.data().is_none()
    }

    /// Processing indicator.
    pub fn shows_processing(&self) -> bool {
        self.phase == DashboardPhase::Processing
    }

    /// Results section: findings have arrived.
    pub fn shows_results(&self) -> bool {
        self.findings.data().is_some()
    }

    /// Findings that get an image viewer.
    pub fn viewer_targets(&self) -> Vec<&Finding> {
        self.findings
            .data()
            .map(Vec::as_slice)
            .map(viewer_targets)
            .unwrap_or_default()
    }

    /// Appends a success toast.
    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast {
            level: ToastLevel::Success,
            message: message.into(),
        });
    }

    /// Appends an error toast.
    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.toasts.push(Toast {
            level: ToastLevel::Error,
            message: message.into(),
        });
    }

    /// Removes and returns pending toasts.
    pub fn drain_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}
