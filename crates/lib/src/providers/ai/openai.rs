use crate::{errors::MetadataError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{self, Debug};
use tracing::{debug, error};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 400;

// --- Responses API request and response structures ---

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage<'a>>,
    text: TextOptions,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: Vec<InputPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputPart<'a> {
    InputText { text: &'a str },
    InputImage { image_url: &'a str },
}

#[derive(Serialize)]
struct TextOptions {
    format: Value,
}

#[derive(Deserialize, Debug)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize, Debug)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize, Debug)]
struct OutputContent {
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// `output_text` when present, else the first text part of `output`.
    fn into_text(self) -> String {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return text;
        }
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .find_map(|part| part.text)
            .unwrap_or_default()
    }
}

/// The JSON schema the model is asked to follow.
fn stock_meta_format() -> Value {
    json!({
        "type": "json_schema",
        "name": "stock_meta",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "keywords": { "type": "array", "items": { "type": "string" } },
                "category": { "type": "integer" }
            },
            "required": ["title", "keywords", "category"],
            "additionalProperties": false
        }
    })
}

// --- OpenAI Provider implementation ---

/// A provider for the OpenAI Responses API with image input.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_output_tokens: u32,
}

impl Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProvider`.
    ///
    /// A missing `api_key` is not an error here; `generate` reports it as
    /// `MetadataError::MissingApiKey` without touching the network.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: String,
        max_output_tokens: u32,
    ) -> Result<Self, MetadataError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(MetadataError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model,
            max_output_tokens,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        image_data_uri: &str,
    ) -> Result<String, MetadataError> {
        let api_key = self.api_key.as_ref().ok_or(MetadataError::MissingApiKey)?;

        let request_body = ResponsesRequest {
            model: &self.model,
            input: vec![InputMessage {
                role: "user",
                content: vec![
                    InputPart::InputText { text: prompt },
                    InputPart::InputImage {
                        image_url: image_data_uri,
                    },
                ],
            }],
            text: TextOptions {
                format: stock_meta_format(),
            },
            max_output_tokens: self.max_output_tokens,
        };

        debug!(api_url = %self.api_url, model = %self.model, "--> Sending image to OpenAI");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(MetadataError::AiRequest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %body, "OpenAI API error");
            return Err(MetadataError::AiApi {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: ResponsesResponse = response
            .json()
            .await
            .map_err(MetadataError::AiDeserialization)?;

        Ok(api_response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_text_prefers_output_text() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "output_text": "{\"title\":\"a\"}",
            "output": [{"content": [{"type": "output_text", "text": "ignored"}]}]
        }))
        .unwrap();
        assert_eq!(response.into_text(), "{\"title\":\"a\"}");
    }

    #[test]
    fn test_into_text_walks_output_items() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [{"type": "output_text", "text": "{}"}]}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_text(), "{}");
    }

    #[test]
    fn test_into_text_empty_when_no_text() {
        let response: ResponsesResponse =
            serde_json::from_value(json!({"output": [{"content": [{"type": "refusal"}]}]}))
                .unwrap();
        assert_eq!(response.into_text(), "");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ResponsesRequest {
            model: "gpt-4.1-mini",
            input: vec![InputMessage {
                role: "user",
                content: vec![
                    InputPart::InputText { text: "describe" },
                    InputPart::InputImage {
                        image_url: "data:image/png;base64,AAAA",
                    },
                ],
            }],
            text: TextOptions {
                format: stock_meta_format(),
            },
            max_output_tokens: 400,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["input"][0]["content"][0]["type"], "input_text");
        assert_eq!(value["input"][0]["content"][1]["type"], "input_image");
        assert_eq!(
            value["input"][0]["content"][1]["image_url"],
            "data:image/png;base64,AAAA"
        );
        assert_eq!(value["text"]["format"]["name"], "stock_meta");
        assert_eq!(value["max_output_tokens"], 400);
    }
}
