//! File selection policy: size and type checks, per-file rejections, and the
//! disclaimer gate in front of submission.

use std::path::Path;

use thiserror::Error;

/// Default per-file size limit (50 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// MIME type used for DICOM files.
pub const DICOM_MIME: &str = "application/dicom";

/// MIME types accepted by default.
pub const DEFAULT_ALLOWED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "application/pdf",
    DICOM_MIME,
    "text/csv",
];

/// Limits applied to every selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Maximum size of a single file in bytes.
    pub max_file_size: u64,
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
}

impl UploadPolicy {
    /// Replaces the size limit.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Returns every reason `file` violates this policy.
    pub fn check(&self, file: &SelectedFile) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();
        if file.size() > self.max_file_size {
            reasons.push(RejectionReason::TooLarge);
        }
        if !self.allowed_types.iter().any(|allowed| *allowed == file.mime) {
            reasons.push(RejectionReason::InvalidType);
        }
        reasons
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|mime| mime.to_string()).collect(),
        }
    }
}

/// One file picked by the patient.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name sent to the backend.
    pub name: String,
    /// MIME type inferred from the name.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Creates a file, inferring the MIME type from the extension.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_for_name(&name);
        Self { name, mime, bytes }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    /// Propagates the I/O error when the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size())
            .finish()
    }
}

fn mime_for_name(name: &str) -> String {
    let extension = Path::new(name)
        .extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase());
    if extension.as_deref() == Some("dcm") {
        return DICOM_MIME.to_string();
    }
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Why a file was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// File exceeds the size limit.
    TooLarge,
    /// File type is not accepted.
    InvalidType,
}

impl RejectionReason {
    /// Stable reason code.
    pub fn code(self) -> &'static str {
        match self {
            Self::TooLarge => "file-too-large",
            Self::InvalidType => "file-invalid-type",
        }
    }
}

/// A file refused at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    /// Rejected file name.
    pub file_name: String,
    /// All violated rules, never empty.
    pub reasons: Vec<RejectionReason>,
}

/// Files accepted so far plus the disclaimer acknowledgement.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    policy: UploadPolicy,
    files: Vec<SelectedFile>,
    disclaimer_accepted: bool,
}

impl FileSelection {
    /// Creates an empty selection governed by `policy`.
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            files: Vec::new(),
            disclaimer_accepted: false,
        }
    }

    /// Adds a batch. Accepted files are appended; rejected ones are returned
    /// and never enter the selection.
    pub fn add(&mut self, batch: impl IntoIterator<Item = SelectedFile>) -> Vec<FileRejection> {
        let mut rejections = Vec::new();
        for file in batch {
            let reasons = self.policy.check(&file);
            if reasons.is_empty() {
                self.files.push(file);
            } else {
                rejections.push(FileRejection {
                    file_name: file.name,
                    reasons,
                });
            }
        }
        rejections
    }

    /// Removes the file at `index`.
    pub fn remove(&mut self, index: usize) -> Option<SelectedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Records the disclaimer checkbox state.
    pub fn set_disclaimer_accepted(&mut self, accepted: bool) {
        self.disclaimer_accepted = accepted;
    }

    /// Disclaimer checkbox state.
    pub fn disclaimer_accepted(&self) -> bool {
        self.disclaimer_accepted
    }

    /// Accepted files in selection order.
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    /// Policy in effect.
    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Returns the files to submit.
    ///
    /// # Errors
    /// Returns [`SelectionError::DisclaimerNotAccepted`] before the disclaimer
    /// is acknowledged and [`SelectionError::NoFiles`] for an empty selection.
    pub fn ready_files(&self) -> Result<Vec<SelectedFile>, SelectionError> {
        if !self.disclaimer_accepted {
            return Err(SelectionError::DisclaimerNotAccepted);
        }
        if self.files.is_empty() {
            return Err(SelectionError::NoFiles);
        }
        Ok(self.files.clone())
    }
}

/// Selection is not ready for submission.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Medical disclaimer not acknowledged.
    #[error("the disclaimer must be acknowledged before uploading")]
    DisclaimerNotAccepted,
    /// Nothing to upload.
    #[error("no files selected")]
    NoFiles,
}
