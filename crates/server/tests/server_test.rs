//! # Server Endpoint Tests
//!
//! This file contains integration tests for the `stockmeta-server` endpoints,
//! including health checks and error handling for invalid input.

mod common;

use anyhow::Result;
use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn test_root_and_health_check_endpoints() -> Result<()> {
    // Arrange
    let app = TestApp::spawn().await?;

    // --- Test Root Endpoint ---
    let root_response = app.client.get(format!("{}/", app.address)).send().await?;

    // Assert
    assert!(root_response.status().is_success());
    assert_eq!("stockmeta server is running.", root_response.text().await?);

    // --- Test Health Check Endpoint ---
    let health_response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?;

    // Assert
    assert!(health_response.status().is_success());
    assert_eq!("OK", health_response.text().await?);

    Ok(())
}

#[tokio::test]
async fn test_analyze_handler_malformed_json() -> Result<()> {
    // Arrange
    let app = TestApp::spawn().await?;
    // This JSON is syntactically invalid (missing closing brace).
    let malformed_body = r#"{"imageBase64": "iVBORw0KGgo""#;

    // Act
    let response = app
        .client
        .post(format!("{}/api/analyze", app.address))
        .header("Content-Type", "application/json")
        .body(malformed_body)
        .send()
        .await?;

    // Assert
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_input");
    assert!(body["details"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn test_analyze_handler_missing_image() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .post_analyze("", &json!({ "filename": "photo.jpg" }))
        .await?;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({ "error": "invalid_input", "details": "Missing imageBase64" })
    );

    Ok(())
}

#[tokio::test]
async fn test_analyze_handler_wrong_field_type() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.post_analyze("", &json!({ "imageBase64": 42 })).await?;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_input");

    Ok(())
}

#[tokio::test]
async fn test_analyze_handler_bad_debug_flag() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .post_analyze("?debug=maybe", &json!({ "imageBase64": "aGVsbG8=" }))
        .await?;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "invalid_input");
    assert!(body["details"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Invalid query string"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_provider_fails_at_startup() {
    let result = TestApp::spawn_with(|config| {
        config.provider.provider = "gemini".to_string();
    })
    .await;

    let err = result.err().expect("Startup should fail");
    assert!(err.to_string().contains("Unsupported AI provider: gemini"));
}

#[tokio::test]
async fn test_local_provider_requires_api_url() {
    let result = TestApp::spawn_with(|config| {
        config.provider.provider = "local".to_string();
        config.provider.api_url = None;
    })
    .await;

    let err = result.err().expect("Startup should fail");
    assert!(err.to_string().contains("api_url is required"));
}
