#![warn(missing_docs)]
//! # caselink-access
//!
//! ## Purpose
//! Validates single-use access links and gates the dashboard on the result.
//!
//! ## Responsibilities
//! - Extract the link id from a dashboard route or URL.
//! - Ask the backend whether a link is valid ([`AccessLinkValidator`]).
//! - Track tri-state link status across identifier changes ([`LinkGate`]),
//!   discarding results of superseded validations.
//! - Run validations as abortable tasks ([`PendingValidation`]).
//!
//! ## Data flow
//! Route -> [`link_id_from_route`] -> [`LinkGate::begin`] issues a
//! [`ValidationTicket`] -> [`spawn_validation`] runs the request ->
//! [`LinkGate::resolve`] applies the status when the ticket is still current.
//!
//! ## Error model
//! Validation outcomes are data ([`LinkStatus`]), not errors: a failed request
//! yields an invalid status with a message. [`AccessError`] only reports tasks
//! that were aborted or crashed before producing a status.
//!
//! ## Security and privacy notes
//! Link ids are logged masked.
//!
//! ## Example
//! ```rust
//! use caselink_access::{LinkGate, LinkStatus, LinkValidity};
//! use caselink_core::LinkId;
//!
//! let mut gate = LinkGate::new();
//! let stale = gate.begin(LinkId::new("old").ok());
//! let current = gate.begin(LinkId::new("new").ok());
//! assert!(!gate.resolve(stale, LinkStatus::invalid("late")));
//! assert!(gate.resolve(current, LinkStatus::valid()));
//! assert_eq!(gate.status().validity, LinkValidity::Valid);
//! ```

use caselink_api::{ApiClient, Endpoint};
use caselink_core::LinkId;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

/// Route segment that precedes the link id.
pub const DASHBOARD_SEGMENT: &str = "dashboard";

const NETWORK_FAILURE_MESSAGE: &str = "Network error occurred while validating the link.";

/// Link validity as last reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkValidity {
    /// Not yet known.
    Unknown,
    /// Backend accepted the link.
    Valid,
    /// Backend rejected the link, or it could not be checked.
    Invalid,
}

/// Observable link status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    /// Validity.
    pub validity: LinkValidity,
    /// `true` while a validation request is in flight.
    pub loading: bool,
    /// Reason for an invalid link, when one is known.
    pub error: Option<String>,
}

impl LinkStatus {
    /// Status before any validation ran.
    pub fn unknown() -> Self {
        Self {
            validity: LinkValidity::Unknown,
            loading: false,
            error: None,
        }
    }

    /// Status while a validation is in flight.
    pub fn pending() -> Self {
        Self {
            loading: true,
            ..Self::unknown()
        }
    }

    /// Accepted link.
    pub fn valid() -> Self {
        Self {
            validity: LinkValidity::Valid,
            loading: false,
            error: None,
        }
    }

    /// Rejected link with a reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            validity: LinkValidity::Invalid,
            loading: false,
            error: Some(reason.into()),
        }
    }

    /// Rejected link without a reason (absent id).
    pub fn missing() -> Self {
        Self {
            validity: LinkValidity::Invalid,
            loading: false,
            error: None,
        }
    }

    /// Returns `true` only for a settled, valid link with no error.
    pub fn is_valid(&self) -> bool {
        !self.loading && self.validity == LinkValidity::Valid && self.error.is_none()
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Backend link validator.
#[derive(Clone)]
pub struct AccessLinkValidator {
    client: ApiClient,
}

impl AccessLinkValidator {
    /// Creates a validator using `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Validates `link` against the backend.
    ///
    /// An absent link is invalid without any network call.
    pub async fn validate(&self, link: Option<&LinkId>) -> LinkStatus {
        let Some(link) = link else {
            debug!("no access link id; skipping validation");
            return LinkStatus::missing();
        };

        let status = match self.client.get(&Endpoint::validate_link(link)).await {
            Ok(_) => LinkStatus::valid(),
            Err(error) => match error.status() {
                Some(code) => LinkStatus::invalid(
                    error
                        .detail()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Link validation failed with status: {code}")),
                ),
                None => {
                    let message = error.to_string();
                    LinkStatus::invalid(if message.trim().is_empty() {
                        NETWORK_FAILURE_MESSAGE.to_string()
                    } else {
                        message
                    })
                }
            },
        };

        info!(%link, validity = ?status.validity, "access link validated");
        status
    }
}

/// Generation marker for one validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTicket {
    generation: u64,
}

/// Tracks the current link and its status; only the latest attempt may
/// update it.
#[derive(Debug, Clone, Default)]
pub struct LinkGate {
    generation: u64,
    link: Option<LinkId>,
    status: LinkStatus,
}

impl LinkGate {
    /// Creates a gate with unknown status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new attempt for `link`, superseding all earlier tickets.
    pub fn begin(&mut self, link: Option<LinkId>) -> ValidationTicket {
        self.generation = self.generation.wrapping_add(1);
        self.link = link;
        self.status = LinkStatus::pending();
        ValidationTicket {
            generation: self.generation,
        }
    }

    /// Applies `status` if `ticket` is current. Returns whether it applied.
    pub fn resolve(&mut self, ticket: ValidationTicket, status: LinkStatus) -> bool {
        if !self.is_current(ticket) {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded link validation"
            );
            return false;
        }
        self.status = status;
        true
    }

    /// Returns `true` when `ticket` belongs to the latest attempt.
    pub fn is_current(&self, ticket: ValidationTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Current status snapshot.
    pub fn status(&self) -> &LinkStatus {
        &self.status
    }

    /// Link of the latest attempt.
    pub fn link(&self) -> Option<&LinkId> {
        self.link.as_ref()
    }
}

/// In-flight validation task.
#[derive(Debug)]
pub struct PendingValidation {
    ticket: ValidationTicket,
    handle: JoinHandle<LinkStatus>,
}

impl PendingValidation {
    /// Ticket the result belongs to.
    pub fn ticket(&self) -> ValidationTicket {
        self.ticket
    }

    /// Aborts the request.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Waits for the status.
    ///
    /// # Errors
    /// Returns [`AccessError::Aborted`] after [`PendingValidation::cancel`],
    /// or [`AccessError::TaskFailed`] when the task panicked.
    pub async fn finish(self) -> Result<(ValidationTicket, LinkStatus), AccessError> {
        match self.handle.await {
            Ok(status) => Ok((self.ticket, status)),
            Err(error) if error.is_cancelled() => Err(AccessError::Aborted),
            Err(error) => Err(AccessError::TaskFailed(error.to_string())),
        }
    }
}

/// Spawns validation of `link` on the tokio runtime.
///
/// # Panics
/// Panics when called outside a Tokio runtime.
pub fn spawn_validation(
    validator: &AccessLinkValidator,
    ticket: ValidationTicket,
    link: Option<LinkId>,
) -> PendingValidation {
    let validator = validator.clone();
    let handle = tokio::spawn(async move { validator.validate(link.as_ref()).await });
    PendingValidation { ticket, handle }
}

/// Extracts the link id from a dashboard route, dashboard URL, or bare id.
///
/// `/dashboard` with no further segment, or a URL that does not point at the
/// dashboard, yields `None`. The id segment is percent-decoded once, so
/// `/dashboard/a%2Bb` names the link `a+b`.
pub fn link_id_from_route(raw: &str) -> Option<LinkId> {
    let trimmed = raw.trim();
    if let Ok(url) = Url::parse(trimmed)
        && matches!(url.scheme(), "http" | "https")
    {
        return link_from_path(url.path());
    }
    if trimmed.starts_with('/') {
        return link_from_path(trimmed);
    }
    LinkId::new(trimmed).ok()
}

fn link_from_path(path: &str) -> Option<LinkId> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    segments.find(|segment| *segment == DASHBOARD_SEGMENT)?;
    let segment = segments.next()?;
    let decoded = urlencoding::decode(segment).ok()?;
    LinkId::new(decoded.as_ref()).ok()
}

/// Errors from validation task handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Validation was cancelled before completion.
    #[error("link validation was aborted")]
    Aborted,
    /// Validation task terminated abnormally.
    #[error("link validation task failed: {0}")]
    TaskFailed(String),
}
