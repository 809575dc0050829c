//! Dashboard session controller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use caselink_access::{
    AccessError, AccessLinkValidator, LinkGate, LinkStatus, PendingValidation, ValidationTicket,
    spawn_validation,
};
use caselink_api::{ApiClient, ApiTransport, HttpTransport};
use caselink_core::{LinkId, UploadResponse};
use caselink_findings::{FindingsService, ReportService};
use caselink_ui::{Catalog, DashboardPhase, DashboardView, FileEntry, render_dashboard};
use caselink_upload::{
    FileRejection, FileSelection, RejectionReason, SelectedFile, SelectionError, UploadPolicy,
    UploadService, UploadSubmission,
};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::{AppError, app_version};

/// One patient dashboard session.
///
/// Owns link status, file selection, queries, and the view projection.
/// Every operation takes `&mut self`, so state changes are sequential.
pub struct Dashboard {
    validator: AccessLinkValidator,
    gate: LinkGate,
    pending: Option<PendingValidation>,
    uploads: UploadService,
    findings: FindingsService,
    reports: ReportService,
    selection: FileSelection,
    view: DashboardView,
    catalog: Catalog,
}

impl Dashboard {
    /// Creates a session over `transport`.
    pub fn new(transport: Arc<dyn ApiTransport>, catalog: Catalog, policy: UploadPolicy) -> Self {
        let client = ApiClient::new(transport);
        let view = DashboardView::new(app_version(), policy.max_file_size);
        Self {
            validator: AccessLinkValidator::new(client.clone()),
            gate: LinkGate::new(),
            pending: None,
            uploads: UploadService::new(client.clone()),
            findings: FindingsService::new(client.clone()),
            reports: ReportService::new(client),
            selection: FileSelection::new(policy),
            view,
            catalog,
        }
    }

    /// Creates a session talking HTTP to the configured backend.
    ///
    /// # Errors
    /// Returns [`AppError::Api`] when the HTTP client cannot be built and
    /// [`AppError::Catalog`] when translation tables fail to load.
    pub fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let transport = HttpTransport::new(&config.api)?;
        let catalog = match &config.locales_dir {
            Some(dir) => Catalog::load_dir(dir, config.locale)?,
            None => Catalog::embedded(config.locale)?,
        };
        let policy = UploadPolicy::default().with_max_file_size(config.max_upload_bytes);
        Ok(Self::new(Arc::new(transport), catalog, policy))
    }

    /// Switches to `link` and starts validating it in the background.
    ///
    /// Any validation still in flight is aborted, and a new link starts a
    /// fresh session view.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn navigate(&mut self, link: Option<LinkId>) -> ValidationTicket {
        if let Some(previous) = self.pending.take() {
            debug!("aborting superseded link validation");
            previous.cancel();
        }

        self.selection = FileSelection::new(self.selection.policy().clone());
        self.view = DashboardView::new(app_version(), self.selection.policy().max_file_size);

        let ticket = self.gate.begin(link.clone());
        self.pending = Some(spawn_validation(&self.validator, ticket, link));
        ticket
    }

    /// Waits for the in-flight validation and applies it.
    ///
    /// Returns `false` when nothing was pending, or when the result belonged
    /// to a superseded link.
    ///
    /// # Errors
    /// Returns [`AppError::Access`] when the validation task crashed.
    pub async fn settle_link(&mut self) -> Result<bool, AppError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };

        let (ticket, status) = match pending.finish().await {
            Ok(outcome) => outcome,
            Err(AccessError::Aborted) => return Ok(false),
            Err(other) => return Err(other.into()),
        };

        if !self.gate.resolve(ticket, status) {
            return Ok(false);
        }
        self.apply_link_status();
        Ok(true)
    }

    /// Navigates to `link` and waits for its validation.
    ///
    /// # Errors
    /// See [`Dashboard::settle_link`].
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub async fn open(&mut self, link: Option<LinkId>) -> Result<&LinkStatus, AppError> {
        self.navigate(link);
        self.settle_link().await?;
        Ok(self.gate.status())
    }

    fn apply_link_status(&mut self) {
        let status = self.gate.status();
        if status.is_valid() {
            self.view.phase = DashboardPhase::AwaitingUpload;
            self.view.link_error = None;
            info!("access link accepted; awaiting upload");
        } else {
            self.view.phase = DashboardPhase::InvalidLink;
            self.view.link_error = status.error.clone();
            warn!(reason = status.error.as_deref().unwrap_or("missing link"), "access link rejected");
        }
    }

    /// Adds picked files. Rejected files produce one error toast per reason
    /// and are returned; accepted files join the selection.
    pub fn add_files(&mut self, batch: impl IntoIterator<Item = SelectedFile>) -> Vec<FileRejection> {
        let rejections = self.selection.add(batch);
        for rejection in &rejections {
            for reason in &rejection.reasons {
                let key = match reason {
                    RejectionReason::TooLarge => "upload.file_too_large",
                    RejectionReason::InvalidType => "upload.file_invalid_type",
                };
                let message = self
                    .catalog
                    .format(key, &[("fileName", rejection.file_name.as_str())]);
                self.view.toast_error(message);
            }
        }
        self.sync_selection();
        rejections
    }

    /// Removes the selected file at `index`.
    pub fn remove_file(&mut self, index: usize) -> Option<SelectedFile> {
        let removed = self.selection.remove(index);
        self.sync_selection();
        removed
    }

    /// Records the disclaimer checkbox state.
    pub fn set_disclaimer_accepted(&mut self, accepted: bool) {
        self.selection.set_disclaimer_accepted(accepted);
        self.sync_selection();
    }

    fn sync_selection(&mut self) {
        self.view.files = self
            .selection
            .files()
            .iter()
            .map(|file| FileEntry {
                name: file.name.clone(),
                size: file.size(),
            })
            .collect();
        self.view.disclaimer_accepted = self.selection.disclaimer_accepted();
    }

    /// Submits the selection for processing, then loads findings and report.
    ///
    /// Runs [`Dashboard::begin_submit`] and [`Dashboard::finish_submit`] back
    /// to back.
    ///
    /// # Errors
    /// See [`Dashboard::begin_submit`] and [`Dashboard::finish_submit`].
    pub async fn submit(&mut self) -> Result<UploadResponse, AppError> {
        let submission = self.begin_submit()?;
        self.finish_submit(submission).await
    }

    /// Checks the selection and enters [`DashboardPhase::Processing`].
    ///
    /// Nothing is sent yet; pass the returned submission to
    /// [`Dashboard::finish_submit`].
    ///
    /// # Errors
    /// - [`AppError::Upload`] with [`caselink_upload::UploadError::MissingLink`]
    ///   when there is no link id.
    /// - [`AppError::UploadRefused`] outside [`DashboardPhase::AwaitingUpload`].
    /// - [`AppError::Selection`] when the disclaimer or files are missing.
    pub fn begin_submit(&mut self) -> Result<UploadSubmission, AppError> {
        let Some(link) = self.gate.link().cloned() else {
            let message = format!(
                "{}: {}",
                self.catalog.text("common.error"),
                self.catalog.text("dashboard.access_link_invalid")
            );
            self.view.toast_error(message);
            return Err(caselink_upload::UploadError::MissingLink.into());
        };

        if self.view.phase != DashboardPhase::AwaitingUpload {
            return Err(AppError::UploadRefused(self.view.phase));
        }

        let files = match self.selection.ready_files() {
            Ok(files) => files,
            Err(selection_error) => {
                let key = match selection_error {
                    SelectionError::DisclaimerNotAccepted => "upload.disclaimer_required",
                    SelectionError::NoFiles => "upload.no_files",
                };
                self.view.toast_error(self.catalog.text(key));
                return Err(selection_error.into());
            }
        };

        let submission = UploadSubmission::new(Some(&link), files)?;
        self.view.phase = DashboardPhase::Processing;
        debug!(%link, files = submission.files().len(), "submission started");
        Ok(submission)
    }

    /// Sends `submission`, then loads findings and report.
    ///
    /// The dashboard shows results once findings load. If the findings fetch
    /// fails it returns to the upload panel with the fetch error visible.
    ///
    /// # Errors
    /// - [`AppError::UploadRefused`] unless [`Dashboard::begin_submit`] put
    ///   the dashboard in [`DashboardPhase::Processing`].
    /// - [`AppError::Upload`] when the backend rejects the submission; the
    ///   dashboard returns to the upload panel.
    pub async fn finish_submit(&mut self, submission: UploadSubmission) -> Result<UploadResponse, AppError> {
        if self.view.phase != DashboardPhase::Processing {
            return Err(AppError::UploadRefused(self.view.phase));
        }
        let link = submission.link().clone();

        let response = match self.uploads.process(&submission).await {
            Ok(response) => response,
            Err(upload_error) => {
                error!(%link, error = %upload_error, "upload failed; returning to upload panel");
                self.toast_failure(&upload_error.message());
                self.view.phase = DashboardPhase::AwaitingUpload;
                return Err(upload_error.into());
            }
        };

        let message = format!(
            "{} - {}",
            self.catalog.text("common.success"),
            self.catalog.text("dashboard.processing_documents")
        );
        self.view.toast_success(message);

        self.refresh_results(&link).await;
        if self.view.findings.data().is_some() {
            self.view.phase = DashboardPhase::ResultsReady;
            info!(%link, upload_id = %response.upload_id, "results ready");
        } else {
            self.view.phase = DashboardPhase::AwaitingUpload;
            warn!(%link, upload_id = %response.upload_id, "findings unavailable; upload panel shown again");
        }
        Ok(response)
    }

    async fn refresh_results(&mut self, link: &LinkId) {
        self.view.findings.start();
        self.view.report.start();

        let (findings, report) = tokio::join!(self.findings.fetch(link), self.reports.fetch(link));

        self.view.findings.settle(findings);
        self.view.report.settle(report);
    }

    /// Downloads the report into `destination`.
    ///
    /// # Errors
    /// Returns [`AppError::ReportUnavailable`] before a report URL is known,
    /// [`AppError::Fetch`] when the download fails, and [`AppError::Io`] when
    /// the file cannot be written. Download and write failures also leave an
    /// error toast.
    pub async fn download_report(&mut self, destination: &Path) -> Result<PathBuf, AppError> {
        let url = self
            .view
            .report
            .data()
            .map(|report| report.report_url.clone())
            .ok_or(AppError::ReportUnavailable)?;

        let bytes = match self.reports.download(&url).await {
            Ok(bytes) => bytes,
            Err(fetch_error) => {
                error!(error = %fetch_error, "report download failed");
                self.toast_failure(fetch_error.message());
                return Err(fetch_error.into());
            }
        };
        if let Err(source) = tokio::fs::write(destination, &bytes).await {
            error!(path = %destination.display(), error = %source, "report could not be saved");
            self.toast_failure(&source.to_string());
            return Err(AppError::Io {
                path: destination.to_path_buf(),
                source,
            });
        }

        let path = destination.display().to_string();
        let message = self
            .catalog
            .format("dashboard.report_saved", &[("path", path.as_str())]);
        self.view.toast_success(message);
        info!(path = %path, bytes = bytes.len(), "report saved");
        Ok(destination.to_path_buf())
    }

    fn toast_failure(&mut self, detail: &str) {
        let message = format!("{}: {}", self.catalog.text("common.error"), detail);
        self.view.toast_error(message);
    }

    /// Current view projection.
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Current link status.
    pub fn link_status(&self) -> &LinkStatus {
        self.gate.status()
    }

    /// Active translation catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Renders the dashboard as text.
    pub fn render(&self) -> String {
        render_dashboard(&self.view, &self.catalog)
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("aborting link validation of dropped dashboard");
            pending.cancel();
        }
    }
}
