pub mod local;
pub mod openai;

use crate::errors::MetadataError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a vision-capable AI provider.
///
/// The normalizer and classifier only ever see the text returned here.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Sends a prompt and an image (as a `data:` URI) and returns the model's text.
    async fn generate(&self, prompt: &str, image_data_uri: &str)
        -> Result<String, MetadataError>;
}

dyn_clone::clone_trait_object!(AiProvider);
