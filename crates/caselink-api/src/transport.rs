use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};

/// Header carrying the deterministic submission key on uploads.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Raw backend response: status code plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Builds a response with a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One part of a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File field.
    File {
        /// Field name.
        name: String,
        /// Original file name.
        file_name: String,
        /// MIME type sent with the part.
        mime: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Transport-neutral multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    /// Parts in submission order.
    pub parts: Vec<FormPart>,
    /// Optional value for [`IDEMPOTENCY_KEY_HEADER`].
    pub idempotency_key: Option<String>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Appends a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        });
        self
    }

    /// Sets the idempotency key header value.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Value of the first text field named `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: field, value } if field == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// File names of all file fields named `name`, in order.
    pub fn file_names(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                FormPart::File {
                    name: field,
                    file_name,
                    ..
                } if field == name => Some(file_name.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Abstract transport used by [`crate::ApiClient`].
///
/// Implementations return every HTTP response as-is, success or not; only
/// failures to obtain a response are errors.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Issues `GET {base}{path}`.
    async fn get(&self, path: &str) -> Result<ApiResponse>;

    /// Issues a multipart `POST {base}{path}`.
    async fn post_multipart(&self, path: &str, form: MultipartForm) -> Result<ApiResponse>;

    /// Fetches an absolute URL, or a URL relative to the base.
    async fn download(&self, url: &str) -> Result<ApiResponse>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Builds a transport for `config`.
    ///
    /// # Errors
    /// Returns [`ApiError::Config`] when the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ApiError::Config(format!("failed to build http client: {error}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(url)
                .map_err(|error| ApiError::Config(format!("invalid relative url: {error}"))),
            Err(error) => Err(ApiError::Config(format!("invalid url: {error}"))),
        }
    }

    async fn collect(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, body_len = body.len(), "received response");
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let response = self
            .client
            .get(self.endpoint(path))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        Self::collect(response).await
    }

    async fn post_multipart(&self, path: &str, form: MultipartForm) -> Result<ApiResponse> {
        let mut body = Form::new();
        for part in form.parts {
            body = match part {
                FormPart::Text { name, value } => body.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str(&mime)
                        .map_err(|error| ApiError::Config(format!("invalid mime type: {error}")))?;
                    body.part(name, part)
                }
            };
        }

        let mut request = self
            .client
            .post(self.endpoint(path))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .multipart(body);
        if let Some(key) = form.idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }

        Self::collect(request.send().await?).await
    }

    async fn download(&self, url: &str) -> Result<ApiResponse> {
        let target = self.resolve(url)?;
        let response = self.client.get(target).send().await?;
        Self::collect(response).await
    }
}
