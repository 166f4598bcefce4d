//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port, with the OpenAI
//! provider pointed at an `httpmock::MockServer` standing in for the model API.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::MockServer;
use reqwest::Client;
use serde_json::{json, Value};
use std::net::SocketAddr;
use stockmeta_server::{
    config::{AppConfig, ProviderConfig},
    router,
    state::{build_app_state, AppState},
};
use tokio::{net::TcpListener, task::JoinHandle};

pub const RESPONSES_PATH: &str = "/v1/responses";
pub const TEST_API_KEY: &str = "test-key";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the server with default analysis settings and a valid API key.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns the server after letting the caller adjust the configuration.
    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        let mock_server = MockServer::start_async().await;
        let mut config = AppConfig {
            port: 0,
            provider: ProviderConfig {
                provider: "openai".to_string(),
                api_url: Some(mock_server.url(RESPONSES_PATH)),
                api_key: Some(TEST_API_KEY.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        customize(&mut config);

        let app_state = build_app_state(config).await?;
        Self::spawn_with_state(app_state, mock_server).await
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state: app_state_for_harness,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Posts a JSON body to `/api/analyze`, with an optional query string.
    pub async fn post_analyze(&self, query: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/api/analyze{query}", self.address))
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A Responses API body whose `output_text` is the given model reply.
pub fn responses_body(text: &str) -> Value {
    json!({
        "id": "resp_test",
        "output_text": text,
        "output": [{
            "type": "message",
            "content": [{"type": "output_text", "text": text}]
        }]
    })
}
