use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use stockmeta::errors::MetadataError;
use stockmeta::providers::ai::AiProvider;

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum MockReply {
    Text(String),
    ApiError { status: u16, body: String },
}

/// A deterministic stand-in for a vision model.
///
/// It replies with canned text (or a canned upstream error) and records every
/// `(prompt, image_data_uri)` pair it receives.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    reply: Arc<Mutex<MockReply>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    /// A provider that always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            reply: Arc::new(Mutex::new(MockReply::Text(response.to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider that always fails like an upstream HTTP error.
    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            reply: Arc::new(Mutex::new(MockReply::ApiError {
                status,
                body: body.to_string(),
            })),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replaces the canned text response.
    pub fn set_response(&self, response: &str) {
        *self.reply.lock().unwrap() = MockReply::Text(response.to_string());
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        image_data_uri: &str,
    ) -> Result<String, MetadataError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), image_data_uri.to_string()));

        match self.reply.lock().unwrap().clone() {
            MockReply::Text(text) => Ok(text),
            MockReply::ApiError { status, body } => Err(MetadataError::AiApi { status, body }),
        }
    }
}

// --- Test-Specific Helpers ---
pub mod helpers {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    /// The signature and IHDR chunk of a 1x1 PNG; enough for MIME sniffing.
    pub const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
    ];

    /// Base64 of [`PNG_HEADER`].
    pub fn sample_png_base64() -> String {
        STANDARD.encode(PNG_HEADER)
    }

    /// Base64 of a buffer starting with the JPEG SOI marker.
    pub fn sample_jpeg_base64() -> String {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        bytes.extend_from_slice(b"JFIF\0\x01\x01");
        STANDARD.encode(bytes)
    }

    /// A model reply with the given fields, wrapped in chatty prose.
    pub fn chatty_reply(title: &str, keywords: &[&str], category: i64) -> String {
        let keywords = keywords
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Sure! Here is the metadata:\n```json\n{{\"title\": \"{title}\", \"keywords\": [{keywords}], \"category\": {category}}}\n```\nLet me know if you need changes."
        )
    }
}
