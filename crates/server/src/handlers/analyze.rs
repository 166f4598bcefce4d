//! # Analyze Handler
//!
//! `POST /api/analyze` accepts `{"imageBase64": "...", "filename": "..."}` and
//! returns the normalized metadata record.

use super::{AppError, AppState, DebugParams};
use crate::router::body_limit;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stockmeta::{AnalyzeImageOptions, MetadataError, MetadataRecord};
use tracing::info;

/// The request body for the `/api/analyze` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// The response body: the record, plus diagnostics when `?debug=true`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub record: MetadataRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

pub async fn analyze_handler(
    State(app_state): State<AppState>,
    debug_params: Result<Query<DebugParams>, QueryRejection>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Query(debug_params) =
        debug_params.map_err(|rejection| MetadataError::InvalidQuery(rejection.body_text()))?;
    let Json(payload) = payload.map_err(|rejection| {
        // The body limit surfaces as a buffering failure inside the JSON rejection.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            MetadataError::RequestBodyTooLarge {
                limit: body_limit(app_state.config.analysis.max_image_base64_len),
            }
        } else {
            MetadataError::InvalidRequestBody(rejection.body_text())
        }
    })?;

    let filename = payload.filename;
    info!(
        filename = filename.as_deref().unwrap_or("unknown"),
        "Received analyze request"
    );

    let options = AnalyzeImageOptions {
        image_base64: payload.image_base64.unwrap_or_default(),
        filename,
    };
    let outcome = app_state.metadata_client.analyze_image(options).await?;

    let debug = debug_params.debug.unwrap_or(false).then(|| {
        json!({
            "raw_response": outcome.raw_response,
            "model_category": outcome.model_category.code(),
        })
    });

    Ok(Json(AnalyzeResponse {
        record: outcome.record,
        debug,
    }))
}
