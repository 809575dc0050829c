use std::fmt;
use std::sync::Arc;

use caselink_core::{LinkId, ProblemDetail};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::transport::{ApiResponse, ApiTransport, MultipartForm};

/// A backend endpoint: request path plus a log-safe name.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: &'static str,
    path: String,
    link: Option<LinkId>,
}

impl Endpoint {
    /// `GET /auth/validate-link/{linkId}`.
    pub fn validate_link(link: &LinkId) -> Self {
        Self::keyed("validate-link", &["auth", "validate-link"], link)
    }

    /// `POST /upload`.
    pub fn upload() -> Self {
        Self {
            name: "upload",
            path: "/upload".to_string(),
            link: None,
        }
    }

    /// `GET /findings/{linkId}`.
    pub fn findings(link: &LinkId) -> Self {
        Self::keyed("findings", &["findings"], link)
    }

    /// `GET /report/{linkId}`.
    pub fn report(link: &LinkId) -> Self {
        Self::keyed("report", &["report"], link)
    }

    fn keyed(name: &'static str, prefix: &[&str], link: &LinkId) -> Self {
        let mut segments: Vec<&str> = prefix.to_vec();
        segments.push(link.as_str());
        Self {
            name,
            path: encode_path(&segments),
            link: Some(link.clone()),
        }
    }

    /// Request path, percent-encoded, with a leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Short endpoint name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{}({link})", self.name),
            None => f.write_str(self.name),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint({self})")
    }
}

/// Joins `segments` into an absolute path, percent-encoding each segment.
pub fn encode_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|segment| {
            let encoded: String = url::form_urlencoded::byte_serialize(segment.as_bytes()).collect();
            format!("/{}", encoded.replace('+', "%20"))
        })
        .collect()
}

/// HTTP client wrapper that turns non-success responses into errors.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
}

impl ApiClient {
    /// Wraps `transport`.
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Issues a GET and returns the successful response.
    ///
    /// # Errors
    /// Returns [`ApiError::Status`] for non-2xx responses (with extracted
    /// problem detail) and propagates transport failures.
    pub async fn get(&self, endpoint: &Endpoint) -> Result<ApiResponse> {
        debug!(%endpoint, "GET");
        let response = self
            .transport
            .get(endpoint.path())
            .await
            .inspect_err(|error| warn!(%endpoint, %error, "transport failure"))?;
        ensure_success(endpoint, response)
    }

    /// Issues a GET and decodes the JSON body.
    ///
    /// # Errors
    /// As [`ApiClient::get`], plus [`ApiError::Decode`] for unexpected bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let response = self.get(endpoint).await?;
        decode(endpoint, &response)
    }

    /// Issues a multipart POST and decodes the JSON body.
    ///
    /// # Errors
    /// As [`ApiClient::get_json`].
    pub async fn post_multipart_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        form: MultipartForm,
    ) -> Result<T> {
        debug!(%endpoint, parts = form.parts.len(), "POST multipart");
        let response = self
            .transport
            .post_multipart(endpoint.path(), form)
            .await
            .inspect_err(|error| warn!(%endpoint, %error, "transport failure"))?;
        let response = ensure_success(endpoint, response)?;
        decode(endpoint, &response)
    }

    /// Downloads `url` and returns the body bytes.
    ///
    /// # Errors
    /// As [`ApiClient::get`].
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let endpoint = Endpoint {
            name: "download",
            path: String::new(),
            link: None,
        };
        let response = self
            .transport
            .download(url)
            .await
            .inspect_err(|error| warn!(%endpoint, %error, "transport failure"))?;
        Ok(ensure_success(&endpoint, response)?.body)
    }
}

fn ensure_success(endpoint: &Endpoint, response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let detail = ProblemDetail::from_body(&response.body)
        .and_then(|problem| problem.detail_message().map(str::to_string));
    warn!(%endpoint, status = response.status, has_detail = detail.is_some(), "non-success response");

    Err(ApiError::Status {
        status: response.status,
        detail,
    })
}

fn decode<T: DeserializeOwned>(endpoint: &Endpoint, response: &ApiResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|error| {
        warn!(%endpoint, %error, "unexpected response body");
        ApiError::Decode(error.to_string())
    })
}
