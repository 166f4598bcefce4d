use thiserror::Error;

/// Custom error types for the metadata pipeline.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Missing imageBase64")]
    MissingImage,
    #[error("Image too large: {size} base64 characters exceeds the limit of {limit}")]
    ImageTooLarge { size: usize, limit: usize },
    #[error("Image payload is not valid base64: {0}")]
    InvalidImage(String),
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),
    #[error("Request body exceeds the limit of {limit} bytes")]
    RequestBodyTooLarge { limit: usize },
    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
    #[error("API key is missing")]
    MissingApiKey,
    #[error("AI provider is missing")]
    MissingAiProvider,
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {status} {body}")]
    AiApi { status: u16, body: String },
    #[error("Empty response from AI provider")]
    EmptyResponse,
    #[error("No JSON object found in AI provider response")]
    NoJsonObjectFound,
    #[error("Failed to parse JSON from AI provider response: {0}")]
    MalformedResponse(String),
}

/// The coarse classes a [`MetadataError`] falls into.
///
/// Callers use this to tell "fix your input" apart from "try again later"
/// and "the model misbehaved".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Configuration,
    Upstream,
    EmptyResponse,
    MalformedResponse,
    NoJsonObjectFound,
}

impl ErrorKind {
    /// A short, machine-stable label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Upstream => "upstream_error",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::NoJsonObjectFound => "no_json_object_found",
        }
    }
}

impl MetadataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetadataError::MissingImage
            | MetadataError::ImageTooLarge { .. }
            | MetadataError::InvalidImage(_)
            | MetadataError::InvalidRequestBody(_)
            | MetadataError::RequestBodyTooLarge { .. }
            | MetadataError::InvalidQuery(_) => ErrorKind::InvalidInput,
            MetadataError::MissingApiKey
            | MetadataError::MissingAiProvider
            | MetadataError::ReqwestClientBuild(_) => ErrorKind::Configuration,
            MetadataError::AiRequest(_)
            | MetadataError::AiDeserialization(_)
            | MetadataError::AiApi { .. } => ErrorKind::Upstream,
            MetadataError::EmptyResponse => ErrorKind::EmptyResponse,
            MetadataError::NoJsonObjectFound => ErrorKind::NoJsonObjectFound,
            MetadataError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_distinct() {
        let kinds = [
            ErrorKind::InvalidInput,
            ErrorKind::Configuration,
            ErrorKind::Upstream,
            ErrorKind::EmptyResponse,
            ErrorKind::MalformedResponse,
            ErrorKind::NoJsonObjectFound,
        ];
        let mut labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), kinds.len());
    }

    #[test]
    fn test_upstream_error_keeps_status_and_body() {
        let err = MetadataError::AiApi {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(
            err.to_string(),
            "AI provider returned an error: 503 overloaded"
        );
    }
}
