//! # `stockmeta-cli` Integration Tests

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use stockmeta::{csv_export::write_csv, Category, MetadataClientBuilder};
use stockmeta_cli::{
    analyze_files, build_provider, collect_rows, display_filename, encode_image_file,
    format_categories, AnalyzeArgs, ProviderKind,
};
use stockmeta_test_utils::{
    helpers::{chatty_reply, sample_png_base64, PNG_HEADER},
    MockAiProvider,
};
use tempfile::tempdir;

fn analyze_args(provider: ProviderKind, api_url: Option<&str>) -> AnalyzeArgs {
    AnalyzeArgs {
        files: vec!["a.png".into()],
        output: None,
        concurrency: 4,
        provider,
        api_url: api_url.map(String::from),
        api_key: None,
        model: "llava".to_string(),
        max_output_tokens: 400,
        no_classify: false,
    }
}

#[test]
fn test_format_categories_lists_full_taxonomy() {
    let listing = format_categories();
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), 21);
    assert_eq!(lines[0], "1 Animals");
    assert_eq!(lines[12], "13 People");
    assert_eq!(lines[20], format!("21 {}", Category::Travel.name()));
}

#[test]
fn test_encode_image_file() -> Result<()> {
    // Arrange
    let dir = tempdir()?;
    let path = dir.path().join("pixel.png");
    fs::write(&path, PNG_HEADER)?;

    // Act
    let encoded = encode_image_file(&path)?;

    // Assert
    assert_eq!(encoded, sample_png_base64());
    assert_eq!(display_filename(&path), "pixel.png");
    Ok(())
}

#[test]
fn test_encode_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.jpg");

    let error_message = encode_image_file(&path).unwrap_err().to_string();

    assert!(
        error_message.contains("Failed to read image"),
        "Unexpected error message: {error_message}"
    );
}

#[test]
fn test_local_provider_requires_api_url() {
    let result = build_provider(&analyze_args(ProviderKind::Local, None));
    let error_message = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(error_message.contains("--api-url is required"));

    assert!(build_provider(&analyze_args(ProviderKind::Local, Some("http://localhost:1/v1"))).is_ok());
    assert!(build_provider(&analyze_args(ProviderKind::Openai, None)).is_ok());
}

#[tokio::test]
async fn test_analyze_files_keeps_order_and_reports_failures() -> Result<()> {
    // Arrange
    let dir = tempdir()?;
    let first = dir.path().join("beach.png");
    let missing = dir.path().join("missing.png");
    let last = dir.path().join("office.png");
    fs::write(&first, PNG_HEADER)?;
    fs::write(&last, PNG_HEADER)?;

    let provider = MockAiProvider::new(&chatty_reply(
        "Team meeting in a bright office",
        &["meeting", "office", "team"],
        13,
    ));
    let client = MetadataClientBuilder::new()
        .ai_provider(Box::new(provider.clone()))
        .build()?;
    let files = vec![first.clone(), missing.clone(), last.clone()];

    // Act
    let reports = analyze_files(&client, &files, 2).await;

    // Assert
    let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, files, "Reports must follow input order");
    assert!(reports[1].result.is_err());
    assert_eq!(provider.get_calls().len(), 2, "Unreadable files never reach the model");

    let (rows, failed) = collect_rows(reports);
    assert_eq!(failed, 1);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].filename, "beach.png");
    assert_eq!(rows[1].filename, "office.png");
    assert_eq!(rows[0].record.category, Category::Business);

    let mut out = Vec::new();
    write_csv(&mut out, &rows)?;
    let csv = String::from_utf8(out)?;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Filename,Title,Keywords,Category,Releases"));
    assert_eq!(
        lines.next(),
        Some("beach.png,Team meeting in a bright office,\"meeting, office, team\",3,")
    );
    Ok(())
}

#[test]
fn test_categories_command() {
    Command::cargo_bin("stockmeta")
        .unwrap()
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("11 Landscape"))
        .stdout(predicate::str::contains("20 Transport"));
}

#[test]
fn test_analyze_command_fails_for_unreadable_files() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out.csv");

    Command::cargo_bin("stockmeta")
        .unwrap()
        .args(["analyze", "does-not-exist.png", "--api-key", "sk-test", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 images could not be analyzed"));

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.trim(), "Filename,Title,Keywords,Category,Releases");
}
