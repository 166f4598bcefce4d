//! # Configuration Loading Tests
//!
//! These tests verify the layering of `get_config`: defaults, the YAML file
//! with `${VAR}` substitution, and environment overrides. They mutate process
//! environment variables and therefore run serially.

use serial_test::serial;
use std::{env, fs};
use stockmeta::{normalize::TitleTruncation, Category};
use stockmeta_server::config::{get_config, ConfigError};
use stockmeta_server::state::build_app_state;
use tempfile::tempdir;

const TOUCHED_VARS: &[&str] = &[
    "PORT",
    "OPENAI_API_KEY",
    "STOCKMETA_TEST_KEY",
    "STOCKMETA_ANALYSIS__NORMALIZER__TITLE_MAX_LEN",
    "STOCKMETA_PROVIDER__MODEL_NAME",
];

fn clear_env() {
    for var in TOUCHED_VARS {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.yml");
    fs::write(&path, content).expect("Failed to write config file");
    let path = path.to_string_lossy().into_owned();
    (dir, path)
}

#[test]
#[serial]
fn test_yaml_file_with_substitution() {
    clear_env();
    env::set_var("STOCKMETA_TEST_KEY", "sk-from-env");
    let (_dir, path) = write_config(
        r#"
port: 8123
provider:
  provider: "openai"
  api_key: "${STOCKMETA_TEST_KEY}"
  model_name: "gpt-4.1"
analysis:
  max_image_base64_len: 1024
  normalizer:
    title_max_len: 60
    title_truncation: "hard"
    fallback_category: 11
  classifier:
    enabled: false
"#,
    );

    let config = get_config(Some(&path)).expect("Config should load");

    assert_eq!(config.port, 8123);
    assert_eq!(config.provider.api_key.as_deref(), Some("sk-from-env"));
    assert_eq!(config.provider.model_name, "gpt-4.1");
    assert_eq!(config.provider.max_output_tokens, 400);
    assert_eq!(config.analysis.max_image_base64_len, 1024);
    assert_eq!(config.analysis.normalizer.title_max_len, 60);
    assert_eq!(
        config.analysis.normalizer.title_truncation,
        TitleTruncation::Hard
    );
    assert_eq!(
        config.analysis.normalizer.fallback_category,
        Category::Landscape
    );
    assert_eq!(config.analysis.normalizer.max_keywords, 50);
    assert!(!config.analysis.classifier.enabled);
    clear_env();
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("PORT", "9999");
    env::set_var("STOCKMETA_ANALYSIS__NORMALIZER__TITLE_MAX_LEN", "100");
    env::set_var("STOCKMETA_PROVIDER__MODEL_NAME", "gpt-4o-mini");
    let (_dir, path) = write_config(
        r#"
port: 8123
provider:
  model_name: "gpt-4.1"
analysis:
  normalizer:
    title_max_len: 60
"#,
    );

    let config = get_config(Some(&path)).expect("Config should load");

    assert_eq!(config.port, 9999);
    assert_eq!(config.analysis.normalizer.title_max_len, 100);
    assert_eq!(config.provider.model_name, "gpt-4o-mini");
    clear_env();
}

#[test]
#[serial]
fn test_api_key_falls_back_to_openai_env() {
    clear_env();
    env::set_var("OPENAI_API_KEY", "sk-fallback");
    let (_dir, path) = write_config("provider:\n  provider: \"openai\"\n");

    let config = get_config(Some(&path)).expect("Config should load");

    assert_eq!(config.provider.api_key.as_deref(), Some("sk-fallback"));
    assert_eq!(config.provider.provider, "openai");
    assert_eq!(
        config.provider.resolved_api_url().as_deref(),
        Some("https://api.openai.com/v1/responses")
    );
    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_config_file() {
    clear_env();
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("does-not-exist.yml");

    let result = get_config(Some(path.to_str().unwrap_or_default()));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_custom_rules_from_yaml() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
analysis:
  classifier:
    fallback_category: 13
    rules:
      - category: 20
        triggers: [" car ", "truck"]
      - category: 5
        triggers: ["robot"]
        exclusions: ["toy"]
"#,
    );

    let config = get_config(Some(&path)).expect("Config should load");

    let rules = config
        .analysis
        .classifier
        .rules
        .expect("Rules should be present");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].category, Category::Transport);
    assert!(rules[0].exclusions.is_empty());
    assert_eq!(rules[1].exclusions, vec!["toy".to_string()]);
    assert_eq!(
        config.analysis.classifier.fallback_category,
        Category::People
    );
}

#[tokio::test]
#[serial]
async fn test_unsupported_provider_kind_is_rejected() {
    clear_env();
    let (_dir, path) = write_config("provider:\n  provider: \"claude\"\n");
    let config = get_config(Some(&path)).expect("Config should load");

    let result = build_app_state(config).await;

    let err = result.err().expect("Unknown provider kind must fail");
    assert!(err.to_string().contains("Unsupported AI provider"));
}
