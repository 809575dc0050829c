#![warn(missing_docs)]
//! # caselink-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `caselink` workspace.
//!
//! ## Responsibilities
//! - Represent the opaque access-link identifier and keep it out of logs.
//! - Model backend response bodies (upload result, findings, report URL).
//! - Model RFC 7807 problem-detail error bodies returned by the backend.
//!
//! ## Data flow
//! Route parsing yields a [`LinkId`]. Services send it to the backend and
//! decode [`UploadResponse`], [`FindingsResponse`] and [`ReportResponse`]
//! bodies; non-success bodies decode into [`ProblemDetail`].
//!
//! ## Ownership and lifetimes
//! Every model owns its strings so decoded values outlive transient network
//! buffers and can be moved into UI state without borrow coupling.
//!
//! ## Error model
//! Construction failures (blank link id) return [`CoreError`].
//!
//! ## Security and privacy notes
//! A link id is a bearer credential for the patient's case. [`LinkId`] only
//! prints a masked prefix through `Debug`/`Display`; callers must use
//! [`LinkId::as_str`] explicitly to put the full value on the wire.
//!
//! ## Example
//! ```rust
//! use caselink_core::LinkId;
//!
//! let link = LinkId::new("a1b2c3d4e5f6").expect("non-empty link id");
//! assert_eq!(link.to_string(), "a1b2…");
//! assert!(LinkId::new("   ").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Finding type paired with an image viewer on the dashboard.
pub const POTENTIAL_NODULE: &str = "potential nodule";

/// Path prefix under which the backend serves uploaded images.
pub const IMAGE_PATH_PREFIX: &str = "/api/images";

const MASKED_PREFIX_CHARS: usize = 4;

/// Opaque single-use access-link identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LinkId(String);

impl LinkId {
    /// Creates a link id from raw input, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyLinkId`] when nothing remains after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CoreError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyLinkId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parses optional input; blank or absent input yields `None`.
    pub fn parse_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| Self::new(value).ok())
    }

    /// Returns the full identifier for wire use.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a log-safe rendering showing only the first few characters.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(MASKED_PREFIX_CHARS).collect();
        format!("{prefix}…")
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkId").field(&self.masked()).finish()
    }
}

/// Successful `/upload` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Human-readable backend acknowledgement.
    #[serde(default)]
    pub message: String,
    /// Backend-assigned upload identifier.
    #[serde(default)]
    pub upload_id: String,
}

/// Rectangle annotation in image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Rectangle width.
    pub width: f64,
    /// Rectangle height.
    pub height: f64,
    /// Optional caption drawn with the rectangle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ImageAnnotation {
    /// Returns `true` when all coordinates are finite and the size is non-negative.
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// One AI-detected observation tied to an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Unique finding identifier.
    pub finding_id: String,
    /// Identifier of the uploaded file the finding refers to.
    pub file_id: String,
    /// Free-text category such as [`POTENTIAL_NODULE`].
    pub finding_type: String,
    /// Optional anatomical location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Patient-facing description.
    pub description: String,
    /// Model or pipeline that produced the finding.
    pub source: String,
    /// Optional rectangles to overlay on the image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_annotations: Option<Vec<ImageAnnotation>>,
}

impl Finding {
    /// Returns `true` when the finding has the given type.
    pub fn is_type(&self, finding_type: &str) -> bool {
        self.finding_type == finding_type
    }

    /// Annotations, or an empty slice when the backend sent none.
    pub fn annotations(&self) -> &[ImageAnnotation] {
        self.image_annotations.as_deref().unwrap_or(&[])
    }
}

/// Successful `/findings/{linkId}` response body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FindingsResponse {
    /// Findings for the case; absent in the body means none.
    #[serde(default)]
    pub findings: Vec<Finding>,
}

/// Successful `/report/{linkId}` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Location of the generated report document.
    pub report_url: String,
}

/// One rejected request parameter inside a [`ProblemDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParam {
    /// Parameter name.
    pub name: String,
    /// Rejection reason.
    pub reason: String,
}

/// RFC 7807 problem-detail error body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Problem type URI.
    #[serde(rename = "type", default)]
    pub problem_type: String,
    /// Short summary.
    #[serde(default)]
    pub title: String,
    /// HTTP status echoed by the server.
    #[serde(default)]
    pub status: u16,
    /// Human-readable explanation, preferred for user-facing messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// URI of the specific occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Per-parameter validation failures.
    #[serde(
        rename = "invalid-params",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub invalid_params: Vec<InvalidParam>,
}

impl ProblemDetail {
    /// Decodes a problem-detail body; any non-JSON body yields `None`.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Returns `detail` when it carries non-blank text.
    pub fn detail_message(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .map(str::trim)
            .filter(|detail| !detail.is_empty())
    }
}

/// Returns the server path of the image behind `file_id`.
pub fn image_path(file_id: &str) -> String {
    format!("{IMAGE_PATH_PREFIX}/{file_id}")
}

/// Core model errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Link id is absent or blank.
    #[error("access link id must be non-empty")]
    EmptyLinkId,
}
