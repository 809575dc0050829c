#![warn(missing_docs)]
//! # caselink-api
//!
//! ## Purpose
//! Thin HTTP client wrapper around the case backend.
//!
//! ## Responsibilities
//! - Load and validate backend connection settings ([`ApiConfig`]).
//! - Issue GET, multipart POST, and download requests through the injectable
//!   [`ApiTransport`] seam; [`HttpTransport`] is the reqwest implementation.
//! - Normalize non-success responses into [`ApiError::Status`] carrying the
//!   server's problem-detail message.
//!
//! ## Data flow
//! Service crates build an [`Endpoint`] -> [`ApiClient`] forwards the path to
//! the transport -> the raw [`ApiResponse`] is checked and decoded.
//!
//! ## Error model
//! Transport failures map to [`ApiError::Network`]; non-2xx responses map to
//! [`ApiError::Status`]; body shape mismatches map to [`ApiError::Decode`].
//! Status-specific user messages are chosen by the calling service.
//!
//! ## Security and privacy notes
//! Endpoints render with a masked link id in logs. Request and response
//! bodies are never logged.

mod client;
mod config;
mod error;
mod transport;

pub use client::{ApiClient, Endpoint, encode_path};
pub use config::{ApiConfig, BASE_URL_ENV, DEFAULT_TIMEOUT, TIMEOUT_ENV};
pub use error::{ApiError, Result};
pub use transport::{
    ApiResponse, ApiTransport, FormPart, HttpTransport, IDEMPOTENCY_KEY_HEADER, MultipartForm,
};
