use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stockmeta::{ErrorKind, MetadataError};
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors originating from the `stockmeta` pipeline.
    Metadata(MetadataError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

/// Conversion from `MetadataError` to `AppError`.
impl From<MetadataError> for AppError {
    fn from(err: MetadataError) -> Self {
        AppError::Metadata(err)
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

/// The HTTP status a pipeline error is reported with.
pub fn status_for(err: &MetadataError) -> StatusCode {
    match (err, err.kind()) {
        (MetadataError::ImageTooLarge { .. }, _)
        | (MetadataError::RequestBodyTooLarge { .. }, _) => StatusCode::PAYLOAD_TOO_LARGE,
        (_, ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::Configuration) => StatusCode::INTERNAL_SERVER_ERROR,
        (_, ErrorKind::Upstream)
        | (_, ErrorKind::EmptyResponse)
        | (_, ErrorKind::MalformedResponse)
        | (_, ErrorKind::NoJsonObjectFound) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, label, details) = match self {
            AppError::Metadata(err) => {
                // Log the original error for debugging purposes
                error!("MetadataError: {:?}", err);
                let details = match &err {
                    MetadataError::MissingApiKey => {
                        "Missing OPENAI_API_KEY on server".to_string()
                    }
                    MetadataError::MissingAiProvider | MetadataError::ReqwestClientBuild(_) => {
                        "Server is not configured correctly.".to_string()
                    }
                    _ => err.to_string(),
                };
                (status_for(&err), err.kind().label(), details)
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": label,
            "details": details,
        }));

        (status_code, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&MetadataError::ImageTooLarge { size: 2, limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&MetadataError::RequestBodyTooLarge { limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&MetadataError::InvalidQuery("debug".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&MetadataError::MissingImage),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&MetadataError::MissingApiKey),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&MetadataError::AiApi {
                status: 503,
                body: "busy".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&MetadataError::NoJsonObjectFound),
            StatusCode::BAD_GATEWAY
        );
    }
}
