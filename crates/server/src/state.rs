//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration and the
//! instantiated `MetadataClient`, making them accessible to all request handlers.

use crate::config::{AppConfig, ProviderConfig};
use std::sync::Arc;
use stockmeta::{
    providers::ai::{local::LocalAiProvider, openai::OpenAiProvider, AiProvider},
    MetadataClient, MetadataClientBuilder,
};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The client that runs the image analysis pipeline.
    pub metadata_client: Arc<MetadataClient>,
}

/// Instantiates the AI provider described by the `provider` section.
///
/// Unknown provider kinds and a `local` provider without `api_url` are
/// startup errors. A missing OpenAI key is not; it is reported per request.
pub fn build_ai_provider(provider_config: &ProviderConfig) -> anyhow::Result<Box<dyn AiProvider>> {
    let provider: Box<dyn AiProvider> = match provider_config.provider.as_str() {
        "openai" => {
            let api_url = provider_config
                .resolved_api_url()
                .ok_or_else(|| anyhow::anyhow!("api_url could not be resolved for openai"))?;
            Box::new(OpenAiProvider::new(
                api_url,
                provider_config.api_key.clone(),
                provider_config.model_name.clone(),
                provider_config.max_output_tokens,
            )?)
        }
        "local" => {
            // For local providers, the URL is always required.
            let api_url = provider_config.resolved_api_url().ok_or_else(|| {
                anyhow::anyhow!(
                    "api_url is required for the local provider. Please set STOCKMETA_PROVIDER__API_URL or provider.api_url in config.yml."
                )
            })?;
            Box::new(LocalAiProvider::new(
                api_url,
                provider_config.api_key.clone(),
                Some(provider_config.model_name.clone()),
            )?)
        }
        other => {
            return Err(anyhow::anyhow!("Unsupported AI provider: {other}"));
        }
    };
    Ok(provider)
}

/// Builds the shared application state from the configuration.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let ai_provider = build_ai_provider(&config.provider)?;
    info!(
        provider = %config.provider.provider,
        model = %config.provider.model_name,
        "AI provider initialized"
    );
    build_app_state_with_provider(config, ai_provider)
}

/// Builds the shared application state around an already constructed provider.
pub fn build_app_state_with_provider(
    config: AppConfig,
    ai_provider: Box<dyn AiProvider>,
) -> anyhow::Result<AppState> {
    let metadata_client = MetadataClientBuilder::new()
        .ai_provider(ai_provider)
        .config(config.analysis.clone())
        .build()?;

    Ok(AppState {
        config: Arc::new(config),
        metadata_client: Arc::new(metadata_client),
    })
}
