#![warn(missing_docs)]
//! # caselink-findings
//!
//! ## Purpose
//! On-demand retrieval of analysis findings and the generated report.
//!
//! ## Responsibilities
//! - Fetch `/findings/{linkId}` and `/report/{linkId}` and map failures to
//!   patient-facing messages ([`FetchError`]).
//! - Parse findings bodies and reject contract violations.
//! - Model a disabled-by-default query ([`Query`]) that only runs when
//!   triggered.
//! - Select the findings that get an image viewer ([`viewer_targets`]).
//! - Download the report document.
//!
//! ## Data flow
//! Successful upload -> controller triggers [`FindingsService::fetch`] and
//! [`ReportService::fetch`] -> results settle the matching [`Query`] -> UI
//! projection.
//!
//! ## Error model
//! 404 and 500 map to distinct variants preferring the server's detail; every
//! other status yields the resource's generic message. Transport and decode
//! failures carry the underlying message.

use caselink_api::{ApiClient, ApiError, Endpoint};
use caselink_core::{Finding, FindingsResponse, LinkId, POTENTIAL_NODULE, ReportResponse};
use thiserror::Error;
use tracing::{error, info};

/// Patient-facing messages for one fetched resource.
#[derive(Debug, Clone, Copy)]
struct FetchMessages {
    not_found: &'static str,
    server: &'static str,
    generic: &'static str,
}

const FINDINGS_MESSAGES: FetchMessages = FetchMessages {
    not_found: "Findings not found. Please ensure documents are uploaded and processed.",
    server: "Internal server error while fetching findings.",
    generic: "Failed to fetch findings data",
};

const REPORT_MESSAGES: FetchMessages = FetchMessages {
    not_found: "Report not found. Please ensure report generation was successful.",
    server: "Internal server error while fetching report URL.",
    generic: "Failed to fetch report URL",
};

/// Fetch failure with a patient-facing message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Backend returned 404.
    #[error("{0}")]
    NotFound(String),
    /// Backend returned 500.
    #[error("{0}")]
    Server(String),
    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

impl FetchError {
    fn from_api(error: ApiError, messages: FetchMessages) -> Self {
        let detail_or = |fallback: &str| {
            error
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string())
        };
        match error.status() {
            Some(404) => Self::NotFound(detail_or(messages.not_found)),
            Some(500) => Self::Server(detail_or(messages.server)),
            Some(_) => Self::Failed(messages.generic.to_string()),
            None => Self::Failed(error.to_string()),
        }
    }

    /// Patient-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(message) | Self::Server(message) | Self::Failed(message) => message,
        }
    }
}

/// Parses a findings body and checks mandatory identifiers.
///
/// # Errors
/// Returns [`FetchError::Failed`] for invalid JSON or findings with a blank
/// `finding_id`.
pub fn parse_findings_response(raw: &[u8]) -> Result<FindingsResponse, FetchError> {
    let parsed: FindingsResponse = serde_json::from_slice(raw)
        .map_err(|error| FetchError::Failed(format!("findings decode failure: {error}")))?;

    if let Some(position) = parsed
        .findings
        .iter()
        .position(|finding| finding.finding_id.trim().is_empty())
    {
        return Err(FetchError::Failed(format!(
            "findings contract violation: finding {position} has an empty finding_id"
        )));
    }

    Ok(parsed)
}

/// Findings that are paired with an image viewer: potential nodules that
/// reference a file.
pub fn viewer_targets(findings: &[Finding]) -> Vec<&Finding> {
    findings
        .iter()
        .filter(|finding| !finding.file_id.is_empty() && finding.is_type(POTENTIAL_NODULE))
        .collect()
}

/// Fetches findings for a link.
#[derive(Clone)]
pub struct FindingsService {
    client: ApiClient,
}

impl FindingsService {
    /// Creates a service using `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetches findings for `link`.
    ///
    /// # Errors
    /// Returns the mapped [`FetchError`].
    pub async fn fetch(&self, link: &LinkId) -> Result<Vec<Finding>, FetchError> {
        let response = self
            .client
            .get(&Endpoint::findings(link))
            .await
            .map_err(|api_error| FetchError::from_api(api_error, FINDINGS_MESSAGES))
            .inspect_err(|fetch_error| error!(%link, error = %fetch_error, "findings fetch failed"))?;

        let parsed = parse_findings_response(&response.body)
            .inspect_err(|fetch_error| error!(%link, error = %fetch_error, "findings body rejected"))?;
        info!(%link, count = parsed.findings.len(), "findings fetched");
        Ok(parsed.findings)
    }
}

/// Fetches and downloads the generated report.
#[derive(Clone)]
pub struct ReportService {
    client: ApiClient,
}

impl ReportService {
    /// Creates a service using `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetches the report location for `link`.
    ///
    /// # Errors
    /// Returns the mapped [`FetchError`].
    pub async fn fetch(&self, link: &LinkId) -> Result<ReportResponse, FetchError> {
        let report: ReportResponse = self
            .client
            .get_json(&Endpoint::report(link))
            .await
            .map_err(|api_error| FetchError::from_api(api_error, REPORT_MESSAGES))
            .inspect_err(|fetch_error| error!(%link, error = %fetch_error, "report fetch failed"))?;
        info!(%link, "report url fetched");
        Ok(report)
    }

    /// Downloads the report document at `url`.
    ///
    /// # Errors
    /// Returns the mapped [`FetchError`].
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .client
            .download(url)
            .await
            .map_err(|api_error| FetchError::from_api(api_error, REPORT_MESSAGES))?;
        info!(bytes = bytes.len(), "report downloaded");
        Ok(bytes)
    }
}

/// State of an on-demand query. Queries start [`Query::Idle`] and only move
/// when explicitly triggered.
#[derive(Debug, Clone, PartialEq)]
pub enum Query<T> {
    /// Never triggered.
    Idle,
    /// Request in flight.
    Loading,
    /// Request succeeded.
    Ready(T),
    /// Request failed.
    Failed(FetchError),
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> Query<T> {
    /// Marks the query as running.
    pub fn start(&mut self) {
        *self = Self::Loading;
    }

    /// Stores the outcome of a run.
    pub fn settle(&mut self, outcome: Result<T, FetchError>) {
        *self = match outcome {
            Ok(value) => Self::Ready(value),
            Err(error) => Self::Failed(error),
        };
    }

    /// Data, when ready.
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Error, when failed.
    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` while in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns `true` before the first trigger.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for status mapping, parsing, and filtering.

    use super::*;

    fn finding(id: &str, file_id: &str, finding_type: &str) -> Finding {
        Finding {
            finding_id: id.to_string(),
            file_id: file_id.to_string(),
            finding_type: finding_type.to_string(),
            location: None,
            description: "description".to_string(),
            source: "model".to_string(),
            image_annotations: None,
        }
    }

    #[test]
    fn not_found_and_server_errors_differ() {
        let not_found = FetchError::from_api(
            ApiError::Status {
                status: 404,
                detail: None,
            },
            FINDINGS_MESSAGES,
        );
        let server = FetchError::from_api(
            ApiError::Status {
                status: 500,
                detail: None,
            },
            FINDINGS_MESSAGES,
        );
        assert!(matches!(not_found, FetchError::NotFound(_)));
        assert!(matches!(server, FetchError::Server(_)));
        assert_ne!(not_found.message(), server.message());
    }

    #[test]
    fn other_statuses_ignore_detail() {
        let error = FetchError::from_api(
            ApiError::Status {
                status: 403,
                detail: Some("forbidden detail".to_string()),
            },
            REPORT_MESSAGES,
        );
        assert_eq!(error.message(), "Failed to fetch report URL");
    }

    #[test]
    fn viewer_targets_select_nodules_with_files() {
        let findings = vec![
            finding("fd-1", "f1", POTENTIAL_NODULE),
            finding("fd-2", "f2", "other"),
            finding("fd-3", "", POTENTIAL_NODULE),
        ];
        let targets = viewer_targets(&findings);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].file_id, "f1");
    }

    #[test]
    fn rejects_blank_finding_ids() {
        let raw = br#"{"findings":[{"finding_id":" ","file_id":"f","finding_type":"t","description":"d","source":"s"}]}"#;
        assert!(matches!(parse_findings_response(raw), Err(FetchError::Failed(_))));
    }

    #[test]
    fn query_starts_idle() {
        let mut query: Query<u8> = Query::default();
        assert!(query.is_idle());
        query.start();
        assert!(query.is_loading());
        query.settle(Ok(7));
        assert_eq!(query.data(), Some(&7));
    }
}
