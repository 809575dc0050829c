//! Integration tests for response normalization in the client wrapper.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use caselink_api::{
    ApiClient, ApiError, ApiResponse, ApiTransport, Endpoint, MultipartForm, Result,
};
use caselink_core::{FindingsResponse, LinkId};
use serde_json::json;

struct FixedTransport {
    response: ApiResponse,
    paths: Mutex<Vec<String>>,
}

impl FixedTransport {
    fn new(response: ApiResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            paths: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ApiTransport for FixedTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.paths.lock().expect("paths lock").push(path.to_string());
        Ok(self.response.clone())
    }

    async fn post_multipart(&self, path: &str, _form: MultipartForm) -> Result<ApiResponse> {
        self.paths.lock().expect("paths lock").push(path.to_string());
        Ok(self.response.clone())
    }

    async fn download(&self, url: &str) -> Result<ApiResponse> {
        self.paths.lock().expect("paths lock").push(url.to_string());
        Ok(self.response.clone())
    }
}

fn link() -> LinkId {
    LinkId::new("link-123").expect("valid link")
}

#[tokio::test]
async fn api_client_tests_extracts_problem_detail_from_failures() {
    let transport = FixedTransport::new(ApiResponse::json(
        404,
        &json!({"type": "about:blank", "title": "Not Found", "status": 404, "detail": "No case for link"}),
    ));
    let client = ApiClient::new(transport.clone());

    let error = client
        .get(&Endpoint::findings(&link()))
        .await
        .expect_err("404 should fail");

    assert_eq!(
        error,
        ApiError::Status {
            status: 404,
            detail: Some("No case for link".to_string())
        }
    );
    assert_eq!(
        transport.paths.lock().expect("paths lock").as_slice(),
        ["/findings/link-123"]
    );
}

#[tokio::test]
async fn api_client_tests_tolerates_non_json_error_bodies() {
    let transport = FixedTransport::new(ApiResponse {
        status: 502,
        body: b"<html>bad gateway</html>".to_vec(),
    });
    let client = ApiClient::new(transport);

    let error = client
        .get(&Endpoint::report(&link()))
        .await
        .expect_err("502 should fail");
    assert_eq!(error.status(), Some(502));
    assert_eq!(error.detail(), None);
}

#[tokio::test]
async fn api_client_tests_decodes_success_bodies() {
    let transport = FixedTransport::new(ApiResponse::json(200, &json!({"findings": []})));
    let client = ApiClient::new(transport);

    let parsed: FindingsResponse = client
        .get_json(&Endpoint::findings(&link()))
        .await
        .expect("findings should decode");
    assert!(parsed.findings.is_empty());
}

#[tokio::test]
async fn api_client_tests_reports_decode_failures() {
    let transport = FixedTransport::new(ApiResponse {
        status: 200,
        body: b"not json".to_vec(),
    });
    let client = ApiClient::new(transport);

    let error = client
        .get_json::<FindingsResponse>(&Endpoint::findings(&link()))
        .await
        .expect_err("body should not decode");
    assert!(matches!(error, ApiError::Decode(_)));
}
