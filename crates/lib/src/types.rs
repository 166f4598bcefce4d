use crate::{
    classify::{default_rules, CategoryRule, Classifier, ClassifierConfig},
    errors::MetadataError,
    normalize::{NormalizerConfig, ResponseNormalizer},
    providers::ai::AiProvider,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The default upper bound on the base64-encoded image size (12 MiB).
pub const DEFAULT_MAX_IMAGE_BASE64_LEN: usize = 12 * 1024 * 1024;

/// The fixed 21-entry Adobe Stock category taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Category {
    Animals = 1,
    BuildingsAndArchitecture = 2,
    Business = 3,
    Drinks = 4,
    Environment = 5,
    StatesOfMind = 6,
    Food = 7,
    GraphicResources = 8,
    HobbiesAndLeisure = 9,
    Industry = 10,
    Landscape = 11,
    Lifestyle = 12,
    People = 13,
    PlantsAndFlowers = 14,
    CultureAndReligion = 15,
    Science = 16,
    SocialIssues = 17,
    Sports = 18,
    Technology = 19,
    Transport = 20,
    Travel = 21,
}

impl Category {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 21;

    /// Every category in code order.
    pub const ALL: [Category; 21] = [
        Category::Animals,
        Category::BuildingsAndArchitecture,
        Category::Business,
        Category::Drinks,
        Category::Environment,
        Category::StatesOfMind,
        Category::Food,
        Category::GraphicResources,
        Category::HobbiesAndLeisure,
        Category::Industry,
        Category::Landscape,
        Category::Lifestyle,
        Category::People,
        Category::PlantsAndFlowers,
        Category::CultureAndReligion,
        Category::Science,
        Category::SocialIssues,
        Category::Sports,
        Category::Technology,
        Category::Transport,
        Category::Travel,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Animals => "Animals",
            Category::BuildingsAndArchitecture => "Buildings and Architecture",
            Category::Business => "Business",
            Category::Drinks => "Drinks",
            Category::Environment => "The Environment",
            Category::StatesOfMind => "States of Mind",
            Category::Food => "Food",
            Category::GraphicResources => "Graphic Resources",
            Category::HobbiesAndLeisure => "Hobbies and Leisure",
            Category::Industry => "Industry",
            Category::Landscape => "Landscape",
            Category::Lifestyle => "Lifestyle",
            Category::People => "People",
            Category::PlantsAndFlowers => "Plants and Flowers",
            Category::CultureAndReligion => "Culture and Religion",
            Category::Science => "Science",
            Category::SocialIssues => "Social Issues",
            Category::Sports => "Sports",
            Category::Technology => "Technology",
            Category::Transport => "Transport",
            Category::Travel => "Travel",
        }
    }

    /// Clamps any integer into the taxonomy range.
    pub fn clamped(value: i64) -> Self {
        let code = value.clamp(Self::MIN as i64, Self::MAX as i64) as u8;
        Self::ALL[(code - Self::MIN) as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

/// The error returned when an integer is outside the category range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCategory(pub i64);

impl fmt::Display for InvalidCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "category {} is outside the range {}..={}",
            self.0,
            Category::MIN,
            Category::MAX
        )
    }
}

impl std::error::Error for InvalidCategory {}

impl TryFrom<i64> for Category {
    type Error = InvalidCategory;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self::clamped(value))
        } else {
            Err(InvalidCategory(value))
        }
    }
}

impl TryFrom<u8> for Category {
    type Error = InvalidCategory;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Category::try_from(value as i64)
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> Self {
        category.code()
    }
}

/// The `{title, keywords, category}` triple produced per image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub keywords: Vec<String>,
    pub category: Category,
}

/// Options for a single `analyze_image` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeImageOptions {
    /// Base64 image data, optionally prefixed with a `data:` URI header.
    pub image_base64: String,
    /// An optional filename, only used as a hint in the prompt.
    #[serde(default)]
    pub filename: Option<String>,
}

/// The outcome of a successful analysis, including diagnostics.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The final, normalized and (optionally) reclassified record.
    pub record: MetadataRecord,
    /// The raw text returned by the AI provider.
    pub raw_response: String,
    /// The category the model chose, after clamping, before reclassification.
    pub model_category: Category,
}

/// Tunables for the whole analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum accepted length of the base64-encoded image.
    pub max_image_base64_len: usize,
    /// Overrides the built-in prompt template when set.
    pub prompt_template: Option<String>,
    pub normalizer: NormalizerConfig,
    pub classifier: ClassifierConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_image_base64_len: DEFAULT_MAX_IMAGE_BASE64_LEN,
            prompt_template: None,
            normalizer: NormalizerConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// A client that turns an image into stock metadata using an AI provider.
pub struct MetadataClient {
    pub ai_provider: Box<dyn AiProvider>,
    pub(crate) config: AnalysisConfig,
    pub(crate) normalizer: ResponseNormalizer,
    pub(crate) classifier: Option<Classifier>,
}

impl fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataClient")
            .field("ai_provider", &self.ai_provider)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

/// A builder for creating `MetadataClient` instances.
#[derive(Default)]
pub struct MetadataClientBuilder {
    ai_provider: Option<Box<dyn AiProvider>>,
    config: AnalysisConfig,
}

impl MetadataClientBuilder {
    /// Creates a new `MetadataClientBuilder`.
    ///
    /// # Examples
    ///
    /// ```
    /// use stockmeta::MetadataClientBuilder;
    ///
    /// let builder = MetadataClientBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the AI provider.
    pub fn ai_provider(mut self, ai_provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(ai_provider);
        self
    }

    /// Sets the pipeline configuration.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the `MetadataClient`.
    ///
    /// Fails with `MetadataError::MissingAiProvider` if no provider was set.
    pub fn build(self) -> Result<MetadataClient, MetadataError> {
        let ai_provider = self.ai_provider.ok_or(MetadataError::MissingAiProvider)?;
        let normalizer = ResponseNormalizer::new(self.config.normalizer.clone());
        let classifier = if self.config.classifier.enabled {
            let rules: Vec<CategoryRule> = self
                .config
                .classifier
                .rules
                .clone()
                .unwrap_or_else(default_rules);
            Some(Classifier::new(
                rules,
                self.config.classifier.fallback_category,
            ))
        } else {
            None
        };

        Ok(MetadataClient {
            ai_provider,
            config: self.config,
            normalizer,
            classifier,
        })
    }
}
