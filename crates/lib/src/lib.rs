//! # Stock Metadata from Images
//!
//! This crate turns an image into Adobe Stock metadata (title, keywords and
//! category) using a configurable vision-capable AI provider. The provider's
//! free-form answer is recovered as JSON, normalized field by field, and the
//! category is re-derived with an ordered rule table.

pub mod classify;
pub mod csv_export;
pub mod errors;
pub mod image;
pub mod normalize;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::{ErrorKind, MetadataError};
pub use types::{
    AnalysisConfig, AnalysisOutcome, AnalyzeImageOptions, Category, MetadataClient,
    MetadataClientBuilder, MetadataRecord,
};

use crate::{image::prepare_image, prompts::build_prompt, prompts::tasks::STOCK_METADATA_PROMPT};
use tracing::{debug, info};

impl MetadataClient {
    /// Analyzes one image and returns its normalized metadata.
    ///
    /// The payload is prechecked before anything leaves the process. The
    /// provider is called exactly once; its failures are returned unchanged.
    pub async fn analyze_image(
        &self,
        options: AnalyzeImageOptions,
    ) -> Result<AnalysisOutcome, MetadataError> {
        let image = prepare_image(&options.image_base64, self.config.max_image_base64_len)?;
        info!(
            mime_type = image.mime_type,
            encoded_len = image.base64.len(),
            filename = options.filename.as_deref().unwrap_or(prompts::UNKNOWN_FILENAME),
            "[analyze_image] image accepted"
        );

        let template = self
            .config
            .prompt_template
            .as_deref()
            .unwrap_or(STOCK_METADATA_PROMPT);
        let prompt = build_prompt(template, options.filename.as_deref(), &self.config.normalizer);
        debug!(prompt = %prompt, "--> Sending prompt to AI Provider");

        let raw_response = self
            .ai_provider
            .generate(&prompt, &image.data_uri())
            .await?;
        debug!("<-- Raw metadata from AI: {}", &raw_response);

        let mut record = self.normalizer.normalize(&raw_response)?;
        let model_category = record.category;

        if let Some(classifier) = &self.classifier {
            let category = classifier.classify(
                &record.title,
                &record.keywords,
                Some(model_category.code() as i64),
            );
            if category != model_category {
                info!(
                    model = %model_category,
                    classified = %category,
                    "[analyze_image] category overridden by classifier"
                );
            }
            record.category = category;
        }

        info!(
            title = %record.title,
            keywords = record.keywords.len(),
            category = record.category.code(),
            "[analyze_image] metadata ready"
        );

        Ok(AnalysisOutcome {
            record,
            raw_response,
            model_category,
        })
    }
}
