#![warn(missing_docs)]
//! # caselink-upload
//!
//! ## Purpose
//! Packages selected documents into a multipart submission and posts it to
//! the backend processing endpoint.
//!
//! ## Responsibilities
//! - Apply size/type policy to selected files ([`FileSelection`]).
//! - Build one [`UploadSubmission`] per submit: files + link id, with a
//!   deterministic idempotency key.
//! - Map `/upload` failures to patient-facing messages ([`UploadError`]).
//!
//! ## Data flow
//! Picked files -> [`FileSelection::add`] -> [`FileSelection::ready_files`] ->
//! [`UploadSubmission::new`] -> [`UploadService::process`] ->
//! [`UploadResponse`].
//!
//! ## Ownership and lifetimes
//! Submissions own their file bytes; a submission lives for one request.
//!
//! ## Error model
//! A missing link id is refused before any network call
//! ([`UploadError::MissingLink`]). Backend statuses 400/413/500 map to
//! dedicated variants preferring the server's problem detail. There is no
//! automatic retry.
//!
//! ## Security and privacy notes
//! File contents are never logged; `Debug` on [`SelectedFile`] prints sizes.

mod selection;

use caselink_api::{ApiClient, ApiError, Endpoint, MultipartForm};
use caselink_core::{LinkId, UploadResponse};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

pub use selection::{
    DEFAULT_ALLOWED_TYPES, DEFAULT_MAX_FILE_SIZE, DICOM_MIME, FileRejection, FileSelection,
    RejectionReason, SelectedFile, SelectionError, UploadPolicy,
};

/// Multipart field name carrying each file.
pub const FILES_FIELD: &str = "files";
/// Multipart field name carrying the link id.
pub const LINK_ID_FIELD: &str = "linkId";

/// Files plus the link they belong to, ready to post.
#[derive(Debug, Clone)]
pub struct UploadSubmission {
    link: LinkId,
    files: Vec<SelectedFile>,
}

impl UploadSubmission {
    /// Builds a submission.
    ///
    /// # Errors
    /// Returns [`UploadError::MissingLink`] without a link id and
    /// [`UploadError::NoFiles`] for an empty file list.
    pub fn new(link: Option<&LinkId>, files: Vec<SelectedFile>) -> Result<Self, UploadError> {
        let link = link.ok_or(UploadError::MissingLink)?.clone();
        if files.is_empty() {
            return Err(UploadError::NoFiles);
        }
        Ok(Self { link, files })
    }

    /// Link the submission belongs to.
    pub fn link(&self) -> &LinkId {
        &self.link
    }

    /// Files in submission order.
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(SelectedFile::size).sum()
    }

    /// Deterministic SHA-256 key over link id, file names, and contents.
    pub fn idempotency_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.link.as_str().as_bytes());
        for file in &self.files {
            hasher.update((file.name.len() as u64).to_be_bytes());
            hasher.update(file.name.as_bytes());
            hasher.update(file.size().to_be_bytes());
            hasher.update(&file.bytes);
        }
        hex::encode(hasher.finalize())
    }

    /// Multipart form: one `files` part per file, then the `linkId` field.
    pub fn to_form(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        for file in &self.files {
            form = form.file(FILES_FIELD, &file.name, &file.mime, file.bytes.clone());
        }
        form.text(LINK_ID_FIELD, self.link.as_str())
            .with_idempotency_key(self.idempotency_key())
    }
}

/// Posts submissions to `/upload`.
#[derive(Clone)]
pub struct UploadService {
    client: ApiClient,
}

impl UploadService {
    /// Creates a service using `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Submits `submission` for processing.
    ///
    /// # Errors
    /// Returns the mapped [`UploadError`] for non-success responses, transport
    /// failures, and undecodable bodies.
    pub async fn process(&self, submission: &UploadSubmission) -> Result<UploadResponse, UploadError> {
        info!(
            link = %submission.link(),
            files = submission.files().len(),
            bytes = submission.total_bytes(),
            "submitting documents for processing"
        );

        let response: UploadResponse = self
            .client
            .post_multipart_json(&Endpoint::upload(), submission.to_form())
            .await
            .map_err(|api_error| {
                let mapped = UploadError::from_api(api_error);
                error!(link = %submission.link(), error = %mapped, "document processing failed");
                mapped
            })?;

        info!(link = %submission.link(), upload_id = %response.upload_id, "documents accepted");
        Ok(response)
    }
}

/// Upload failures with patient-facing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// No link id; refused before any request.
    #[error("access link is missing; upload refused")]
    MissingLink,
    /// Nothing to submit.
    #[error("no files to upload")]
    NoFiles,
    /// Backend returned 400.
    #[error("{0}")]
    InvalidRequest(String),
    /// Backend returned 413.
    #[error("{0}")]
    PayloadTooLarge(String),
    /// Backend returned 500.
    #[error("{0}")]
    Server(String),
    /// Backend returned another non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status.
        status: u16,
        /// Generic message.
        message: String,
    },
    /// No response was obtained.
    #[error("{0}")]
    Transport(String),
    /// Success response had an unexpected body.
    #[error("Document processing failed due to an unexpected error.")]
    Decode(String),
}

impl UploadError {
    fn from_api(error: ApiError) -> Self {
        let detail_or = |fallback: &str| {
            error
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string())
        };
        match &error {
            ApiError::Status { status: 400, .. } => {
                Self::InvalidRequest(detail_or("Invalid request data. Please check your inputs."))
            }
            ApiError::Status { status: 413, .. } => {
                Self::PayloadTooLarge(detail_or("Payload too large. Please reduce file sizes."))
            }
            ApiError::Status { status: 500, .. } => {
                Self::Server(detail_or("Internal server error during document processing."))
            }
            ApiError::Status { status, .. } => Self::Rejected {
                status: *status,
                message: "Document processing failed".to_string(),
            },
            ApiError::Decode(reason) => Self::Decode(reason.clone()),
            ApiError::Network(_) | ApiError::Config(_) => Self::Transport(error.to_string()),
        }
    }

    /// Patient-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
