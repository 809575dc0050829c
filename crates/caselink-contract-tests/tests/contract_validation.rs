//! Validates contract fixtures against frozen JSON schemas and the crate
//! decoders.

use caselink_core::{ProblemDetail, ReportResponse, UploadResponse};
use caselink_findings::parse_findings_response;
use jsonschema::JSONSchema;
use serde_json::Value;

const CONTRACTS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../contracts");

fn load_json(path: &str) -> Value {
    let raw = std::fs::read_to_string(path).expect("json file should be readable");
    serde_json::from_str(&raw).expect("json file should be valid")
}

fn schema(name: &str) -> JSONSchema {
    let schema = load_json(&format!("{CONTRACTS_DIR}/{name}.schema.json"));
    JSONSchema::compile(&schema).expect("schema should compile")
}

fn fixture(name: &str) -> Value {
    load_json(&format!("{CONTRACTS_DIR}/fixtures/{name}.json"))
}

#[test]
fn findings_fixture_matches_schema_and_decoder() {
    let fixture = fixture("findings-response.valid");
    assert!(
        schema("findings-response").is_valid(&fixture),
        "findings fixture should validate against schema"
    );

    let parsed = parse_findings_response(fixture.to_string().as_bytes())
        .expect("findings fixture should decode");
    assert_eq!(parsed.findings.len(), 2);
    assert_eq!(parsed.findings[0].annotations().len(), 1);
    assert!(parsed.findings[1].location.is_none());
}

#[test]
fn findings_without_identifier_fail_schema_and_decoder() {
    let fixture = fixture("findings-response.invalid");
    assert!(!schema("findings-response").is_valid(&fixture));
    assert!(parse_findings_response(fixture.to_string().as_bytes()).is_err());
}

#[test]
fn report_fixture_matches_schema_and_decoder() {
    let fixture = fixture("report-response.valid");
    assert!(schema("report-response").is_valid(&fixture));

    let report: ReportResponse =
        serde_json::from_value(fixture).expect("report fixture should decode");
    assert!(report.report_url.ends_with("abc123.pdf"));
}

#[test]
fn upload_fixture_matches_schema_and_decoder() {
    let fixture = fixture("upload-response.valid");
    assert!(schema("upload-response").is_valid(&fixture));

    let response: UploadResponse =
        serde_json::from_value(fixture).expect("upload fixture should decode");
    assert_eq!(response.upload_id, "up-7f3a");
}

#[test]
fn problem_detail_fixture_matches_schema_and_decoder() {
    let fixture = fixture("problem-detail.valid");
    assert!(schema("problem-detail").is_valid(&fixture));

    let problem = ProblemDetail::from_body(fixture.to_string().as_bytes())
        .expect("problem detail fixture should decode");
    assert_eq!(problem.status, 413);
    assert_eq!(
        problem.detail_message(),
        Some("Each file must be 50 MB or smaller.")
    );
    assert_eq!(problem.invalid_params.len(), 1);
}
