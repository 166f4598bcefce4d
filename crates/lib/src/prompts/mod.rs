//! # Prompt Templates
//!
//! Rendering of the prompt that accompanies each image.

pub mod tasks;

use crate::{normalize::NormalizerConfig, types::Category};

/// The filename hint used when the caller does not provide one.
pub const UNKNOWN_FILENAME: &str = "unknown";

/// One `"<code> <name>"` line per category, indented for the prompt.
pub fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|category| format!("  {} {}", category.code(), category.name()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the placeholders of `template`.
pub fn build_prompt(template: &str, filename: Option<&str>, limits: &NormalizerConfig) -> String {
    let filename = filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_FILENAME);

    template
        .replace("{title_max_len}", &limits.title_max_len.to_string())
        .replace("{max_keywords}", &limits.max_keywords.to_string())
        .replace("{categories}", &category_list())
        .replace("{filename}", filename)
        .trim()
        .to_string()
}
