//! # Response Normalizer
//!
//! Turns the free-form text returned by a vision model into a well-formed
//! [`MetadataRecord`]. Only a missing or unparseable JSON payload is an error;
//! once an object has been recovered, each field degrades on its own.

use crate::{
    errors::MetadataError,
    types::{Category, MetadataRecord},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// How the JSON object is located inside the raw model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// The whole trimmed text must be a JSON object.
    Strict,
    /// Parse the span from the first `{` to the last `}`.
    #[default]
    Lenient,
}

/// How over-long titles are shortened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleTruncation {
    /// Cut at exactly the maximum number of characters.
    Hard,
    /// Prefer cutting at the last space before the limit.
    #[default]
    WordBoundary,
}

/// Limits and fallbacks applied by the [`ResponseNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub extraction: ExtractionStrategy,
    /// Maximum title length in characters (inclusive).
    pub title_max_len: usize,
    pub title_truncation: TitleTruncation,
    /// A word-boundary cut is only taken if the space lies past this position.
    pub title_min_word_cut: usize,
    pub title_fallback: String,
    pub max_keywords: usize,
    /// Used when the model's category is not an integer.
    pub fallback_category: Category,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionStrategy::Lenient,
            title_max_len: 70,
            title_truncation: TitleTruncation::WordBoundary,
            title_min_word_cut: 40,
            title_fallback: "AI generated image".to_string(),
            max_keywords: 50,
            fallback_category: Category::People,
        }
    }
}

/// Extracts and sanitizes metadata from raw model output.
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    config: NormalizerConfig,
}

impl ResponseNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalizes raw model output into a [`MetadataRecord`].
    ///
    /// Fails with `EmptyResponse` on blank input, `NoJsonObjectFound` when the
    /// lenient strategy finds no brace-delimited span, and `MalformedResponse`
    /// when the candidate text is not a JSON object.
    pub fn normalize(&self, raw_text: &str) -> Result<MetadataRecord, MetadataError> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return Err(MetadataError::EmptyResponse);
        }

        let object = extract_json_object(trimmed, self.config.extraction)?;
        debug!(fields = ?object.keys().collect::<Vec<_>>(), "Extracted JSON object from model output");

        let title = normalize_title(object.get("title"), &self.config);
        let keywords = normalize_keywords(object.get("keywords"), self.config.max_keywords);
        let category = normalize_category(object.get("category"), self.config.fallback_category);

        Ok(MetadataRecord {
            title,
            keywords,
            category,
        })
    }
}

/// Locates and parses the JSON object inside `text`.
pub fn extract_json_object(
    text: &str,
    strategy: ExtractionStrategy,
) -> Result<Map<String, Value>, MetadataError> {
    let candidate = match strategy {
        ExtractionStrategy::Strict => text,
        ExtractionStrategy::Lenient => match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if end > start => &text[start..=end],
            _ => return Err(MetadataError::NoJsonObjectFound),
        },
    };

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        warn!(raw = %text, "JSON parse error in model output");
        MetadataError::MalformedResponse(e.to_string())
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(MetadataError::MalformedResponse(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Scalars become text; null, arrays and objects have none.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Coerces, trims, substitutes the fallback and truncates the title.
pub fn normalize_title(value: Option<&Value>, config: &NormalizerConfig) -> String {
    let title = value.and_then(scalar_text).unwrap_or_default();
    let title = title.trim();

    let truncate = |text: &str| {
        truncate_title(
            text,
            config.title_max_len,
            config.title_truncation,
            config.title_min_word_cut,
        )
    };

    if title.is_empty() {
        warn!("Model output has no usable title, using fallback");
        return truncate(config.title_fallback.trim());
    }

    let truncated = truncate(title);
    if truncated.is_empty() {
        truncate(config.title_fallback.trim())
    } else {
        truncated
    }
}

/// Shortens `title` to at most `max_len` characters.
///
/// With [`TitleTruncation::WordBoundary`] the cut moves back to the nearest
/// space when that space lies past `min_word_cut`; otherwise the hard cut is
/// kept. A title of exactly `max_len` characters is returned unchanged.
pub fn truncate_title(
    title: &str,
    max_len: usize,
    truncation: TitleTruncation,
    min_word_cut: usize,
) -> String {
    let cut = match title.char_indices().nth(max_len) {
        Some((index, _)) => index,
        None => return title.to_string(),
    };
    let hard = &title[..cut];

    let truncated = match truncation {
        TitleTruncation::Hard => hard,
        TitleTruncation::WordBoundary => {
            let at_boundary = title[cut..].starts_with(char::is_whitespace);
            match hard.rfind(' ') {
                _ if at_boundary => hard,
                Some(space) if hard[..space].chars().count() > min_word_cut => &hard[..space],
                _ => hard,
            }
        }
    };

    truncated.trim_end().to_string()
}

/// Lowercases, trims, drops empties, dedupes (first wins) and caps the list.
pub fn normalize_keywords(value: Option<&Value>, max_keywords: usize) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(
                "Model keywords field is {}, treating as empty",
                json_type_name(other)
            );
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(scalar_text)
        .map(|keyword| keyword.to_lowercase().trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.clone()))
        .take(max_keywords)
        .collect()
}

/// Parses the category, substituting `fallback` for non-integers and
/// clamping everything else into `1..=21`.
pub fn normalize_category(value: Option<&Value>, fallback: Category) -> Category {
    match value.and_then(parse_category) {
        Some(code) => Category::clamped(code),
        None => {
            warn!(?value, %fallback, "Model category is not an integer, using fallback");
            fallback
        }
    }
}

fn parse_category(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

/// Reads the optionally signed run of decimal digits at the start of `text`.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Overlong digit runs saturate; they get clamped afterwards anyway.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
