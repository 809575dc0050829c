//! Shared fixtures for app integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use caselink_api::{ApiResponse, ApiTransport, MultipartForm, Result};
use caselink_app::Dashboard;
use caselink_ui::{Catalog, Locale};
use caselink_upload::UploadPolicy;
use serde_json::{Value, json};

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum Call {
    /// `GET` on a path.
    Get(String),
    /// Multipart `POST` on a path.
    Post(String, MultipartForm),
    /// Download of an absolute or relative URL.
    Download(String),
}

/// In-memory backend answering from a path table; unknown paths are 404.
///
/// Paths registered with [`ScriptedTransport::stall`] never answer.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, ApiResponse>>,
    stalled: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Empty script.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers `path` with `status` and a JSON body.
    pub fn route(&self, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .expect("routes lock")
            .insert(path.to_string(), ApiResponse::json(status, &body));
    }

    /// Makes requests to `path` hang.
    pub fn stall(&self, path: &str) {
        self.stalled.lock().expect("stalled lock").push(path.to_string());
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Number of `GET`s on `path`.
    pub fn gets(&self, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Get(seen) if seen == path))
            .count()
    }

    /// Every multipart form posted.
    pub fn posts(&self) -> Vec<MultipartForm> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Post(_, form) => Some(form),
                _ => None,
            })
            .collect()
    }

    async fn answer(&self, path: &str) -> Result<ApiResponse> {
        let stalled = self.stalled.lock().expect("stalled lock").iter().any(|p| p == path);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let routes = self.routes.lock().expect("routes lock");
        Ok(routes
            .get(path)
            .cloned()
            .unwrap_or_else(|| ApiResponse::json(404, &json!({"status": 404}))))
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.calls.lock().expect("calls lock").push(Call::Get(path.to_string()));
        self.answer(path).await
    }

    async fn post_multipart(&self, path: &str, form: MultipartForm) -> Result<ApiResponse> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(Call::Post(path.to_string(), form));
        self.answer(path).await
    }

    async fn download(&self, url: &str) -> Result<ApiResponse> {
        self.calls.lock().expect("calls lock").push(Call::Download(url.to_string()));
        self.answer(url).await
    }
}

/// Script where link `good` is valid and every endpoint succeeds.
#[allow(dead_code)]
pub fn happy_backend() -> Arc<ScriptedTransport> {
    let transport = ScriptedTransport::new();
    transport.route("/auth/validate-link/good", 200, json!({"valid": true}));
    transport.route(
        "/upload",
        200,
        json!({"message": "Files uploaded successfully", "uploadId": "up-1"}),
    );
    transport.route(
        "/findings/good",
        200,
        json!({"findings": [
            {
                "finding_id": "fd-1",
                "file_id": "f1",
                "finding_type": "potential nodule",
                "location": "right upper lobe",
                "description": "8 mm nodule",
                "source": "cxr-model",
                "image_annotations": [{"x": 10.0, "y": 12.0, "width": 30.0, "height": 28.0}]
            },
            {
                "finding_id": "fd-2",
                "file_id": "f2",
                "finding_type": "other",
                "description": "mild effusion",
                "source": "cxr-model"
            }
        ]}),
    );
    transport.route(
        "/report/good",
        200,
        json!({"reportUrl": "/reports/good.pdf"}),
    );
    transport
}

/// Dashboard over `transport` with English tables and the default policy.
#[allow(dead_code)]
pub fn dashboard(transport: &Arc<ScriptedTransport>) -> Dashboard {
    dashboard_with_policy(transport, UploadPolicy::default())
}

/// Dashboard over `transport` with `policy`.
#[allow(dead_code)]
pub fn dashboard_with_policy(transport: &Arc<ScriptedTransport>, policy: UploadPolicy) -> Dashboard {
    let catalog = Catalog::embedded(Locale::En).expect("embedded tables parse");
    Dashboard::new(transport.clone(), catalog, policy)
}
