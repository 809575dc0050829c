//! Integration tests for access-link validation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use caselink_access::{
    AccessError, AccessLinkValidator, LinkGate, LinkValidity, spawn_validation,
};
use caselink_api::{ApiClient, ApiError, ApiResponse, ApiTransport, MultipartForm, Result};
use caselink_core::LinkId;
use serde_json::json;

/// Answers validation requests by link id; `slow-*` links never answer.
struct LinkTable {
    calls: Mutex<Vec<String>>,
}

impl LinkTable {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl ApiTransport for LinkTable {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.calls.lock().expect("calls lock").push(path.to_string());
        let link = path.rsplit('/').next().unwrap_or_default();
        match link {
            "good" => Ok(ApiResponse::json(200, &json!({"valid": true}))),
            "expired" => Ok(ApiResponse::json(
                410,
                &json!({"title": "Gone", "status": 410, "detail": "This link has expired"}),
            )),
            "forbidden" => Ok(ApiResponse {
                status: 403,
                body: Vec::new(),
            }),
            "offline" => Err(ApiError::Network("connection refused".to_string())),
            slow if slow.starts_with("slow") => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ApiResponse::json(200, &json!({})))
            }
            _ => Ok(ApiResponse::json(404, &json!({"status": 404}))),
        }
    }

    async fn post_multipart(&self, _path: &str, _form: MultipartForm) -> Result<ApiResponse> {
        unreachable!("validation never posts")
    }

    async fn download(&self, _url: &str) -> Result<ApiResponse> {
        unreachable!("validation never downloads")
    }
}

fn validator(table: &Arc<LinkTable>) -> AccessLinkValidator {
    AccessLinkValidator::new(ApiClient::new(table.clone()))
}

fn link(raw: &str) -> LinkId {
    LinkId::new(raw).expect("valid link")
}

#[tokio::test]
async fn link_validation_tests_absent_link_skips_network() {
    let table = LinkTable::new();
    let status = validator(&table).validate(None).await;

    assert_eq!(status.validity, LinkValidity::Invalid);
    assert!(!status.loading);
    assert!(table.calls().is_empty());
}

#[tokio::test]
async fn link_validation_tests_accepts_2xx() {
    let table = LinkTable::new();
    let status = validator(&table).validate(Some(&link("good"))).await;

    assert!(status.is_valid());
    assert_eq!(table.calls(), vec!["/auth/validate-link/good".to_string()]);
}

#[tokio::test]
async fn link_validation_tests_prefers_server_detail() {
    let table = LinkTable::new();
    let status = validator(&table).validate(Some(&link("expired"))).await;

    assert_eq!(status.validity, LinkValidity::Invalid);
    assert_eq!(status.error.as_deref(), Some("This link has expired"));
}

#[tokio::test]
async fn link_validation_tests_falls_back_to_status_message() {
    let table = LinkTable::new();
    let status = validator(&table).validate(Some(&link("forbidden"))).await;

    assert_eq!(
        status.error.as_deref(),
        Some("Link validation failed with status: 403")
    );
}

#[tokio::test]
async fn link_validation_tests_network_failure_is_invalid() {
    let table = LinkTable::new();
    let status = validator(&table).validate(Some(&link("offline"))).await;

    assert_eq!(status.validity, LinkValidity::Invalid);
    assert!(
        status
            .error
            .as_deref()
            .is_some_and(|message| message.contains("connection refused"))
    );
}

#[tokio::test]
async fn link_validation_tests_superseded_validation_cannot_overwrite() {
    let table = LinkTable::new();
    let validator = validator(&table);
    let mut gate = LinkGate::new();

    let stale_ticket = gate.begin(Some(link("slow-old")));
    let stale = spawn_validation(&validator, stale_ticket, gate.link().cloned());

    let fresh_ticket = gate.begin(Some(link("good")));
    stale.cancel();
    let fresh = spawn_validation(&validator, fresh_ticket, gate.link().cloned());

    assert_eq!(stale.finish().await, Err(AccessError::Aborted));

    let (ticket, status) = fresh.finish().await.expect("fresh validation completes");
    assert!(gate.resolve(ticket, status));
    assert!(gate.status().is_valid());
    assert_eq!(gate.link().map(LinkId::as_str), Some("good"));

    assert!(!gate.resolve(stale_ticket, caselink_access::LinkStatus::invalid("late")));
    assert!(gate.status().is_valid());
}
