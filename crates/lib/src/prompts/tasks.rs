//! # Default Task Prompts
//!
//! The default prompt template for stock metadata generation. It can be
//! overridden through `AnalysisConfig::prompt_template`.

/// The default prompt sent alongside the image.
///
/// Placeholders: `{title_max_len}`, `{max_keywords}`, `{categories}`, `{filename}`
pub const STOCK_METADATA_PROMPT: &str = r#"You are an expert Adobe Stock contributor assistant.

Look at the image and create metadata for Adobe Stock CSV:
- "title": short, natural English title, max {title_max_len} characters, no hashtags, no quotes, no emojis.
- "keywords": 30-{max_keywords} keywords in English, array of strings, most important first, no duplicates, no emojis.
- "category": integer 1-21 according to Adobe Stock categories:
{categories}

Return ONLY valid JSON, nothing else.
JSON shape:

{
  "title": "string",
  "keywords": ["string", "..."],
  "category": 1
}

If the filename gives useful hints, you can use it too.
Filename: {filename}"#;
