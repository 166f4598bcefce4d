//! # Category Classifier
//!
//! Re-derives the stock category from the title and keywords with an ordered
//! list of substring rules. The first rule that fires wins, so the order of
//! [`default_rules`] is significant: earlier categories pre-empt later ones.
//! When nothing fires, the model's own (clamped) category is kept.

use crate::types::Category;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single classification rule.
///
/// The rule fires when the haystack contains any of `triggers` and none of
/// `exclusions`. Matching is plain substring containment on a lowercase,
/// space-padded haystack, so a trigger such as `" cat "` only matches the
/// whole word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    pub triggers: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, triggers: &[&str], exclusions: &[&str]) -> Self {
        Self {
            category,
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
            exclusions: exclusions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.triggers.iter().any(|t| haystack.contains(t.as_str()))
            && !self.exclusions.iter().any(|e| haystack.contains(e.as_str()))
    }
}

/// Settings for the classifier stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// When false the normalized model category is returned untouched.
    pub enabled: bool,
    /// Used when no rule fires and the model gave no category at all.
    pub fallback_category: Category,
    /// Replaces the built-in rule table when set.
    pub rules: Option<Vec<CategoryRule>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback_category: Category::Landscape,
            rules: None,
        }
    }
}

/// Lowercases `text` and turns every character other than alphanumerics, `-`
/// and `'` into a separator. Each run of separators becomes one space, so a
/// leading or trailing separator survives as a single space.
pub fn fold_text(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '-' || c == '\'' {
            if pending_space {
                folded.push(' ');
                pending_space = false;
            }
            folded.push(c);
        } else {
            pending_space = true;
        }
    }
    if pending_space {
        folded.push(' ');
    }
    folded
}

/// Builds the haystack from a title and its keywords.
///
/// The joined text is folded with [`fold_text`] and padded with a single
/// space on both sides. Rule terms are folded the same way by
/// [`Classifier::new`], so `"c++"` matches a title containing `C++`.
pub fn build_haystack<S: AsRef<str>>(title: &str, keywords: &[S]) -> String {
    let mut joined = title.to_string();
    for keyword in keywords {
        joined.push(' ');
        joined.push_str(keyword.as_ref());
    }
    format!(" {} ", fold_text(&joined).trim())
}

// Folds rule terms into haystack form; terms with no word characters left are dropped.
fn fold_terms(category: Category, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter_map(|term| {
            let folded = fold_text(term);
            if folded.trim().is_empty() {
                warn!(
                    category = %category,
                    term = %term,
                    "Ignoring rule term without word characters"
                );
                None
            } else {
                Some(folded)
            }
        })
        .collect()
}

/// Deterministic, rule-based category override.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
    fallback: Category,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules(), Category::Landscape)
    }
}

impl Classifier {
    pub fn new(rules: Vec<CategoryRule>, fallback: Category) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| CategoryRule {
                category: rule.category,
                triggers: fold_terms(rule.category, &rule.triggers),
                exclusions: fold_terms(rule.category, &rule.exclusions),
            })
            .collect();
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Returns the category of the first matching rule, or the clamped
    /// `model_category` (the classifier fallback when `None`).
    pub fn classify<S: AsRef<str>>(
        &self,
        title: &str,
        keywords: &[S],
        model_category: Option<i64>,
    ) -> Category {
        let haystack = build_haystack(title, keywords);

        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(&haystack)) {
            debug!(category = %rule.category, "Classifier rule matched");
            return rule.category;
        }

        match model_category {
            Some(code) => Category::clamped(code),
            None => self.fallback,
        }
    }
}

/// The built-in rule table, highest priority first.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            Category::Animals,
            &[
                "animal", "wildlife", "fauna", " pet ", " pets ", " cat ", " cats ", "kitten",
                " dog ", " dogs ", "puppy", "puppies", " bird ", " birds ", " horse ", " horses ",
                " lion", "tiger", "elephant", "giraffe", "zebra", "monkey", " bear ", " bears ",
                "rabbit", "bunny", "squirrel", " fox ", " wolf", "deer", " cow ", " cows ",
                "cattle", "sheep", " goat", "butterfly", "insect", "reptile", "snake", "lizard",
                "turtle", "dolphin", "whale", "shark", " owl", "eagle", "parrot", "penguin",
                "mammal", " zoo ",
            ],
            &[" hot dog", "hotdog", "bird's eye", "birds eye", "bird's-eye", "birds-eye"],
        ),
        CategoryRule::new(
            Category::PlantsAndFlowers,
            &[
                "flower", "blossom", "bloom", " plant ", " plants ", "foliage", " leaf",
                " leaves", " rose ", " roses ", "tulip", "orchid", "daisy", "sunflower",
                " lily", "botanical", "succulent", "cactus", " fern", "petal", "houseplant",
                "bouquet",
            ],
            &[
                "landscape", "panorama", "panoramic", "aerial view", "scenic", " power plant",
            ],
        ),
        CategoryRule::new(
            Category::Landscape,
            &[
                "landscape", "mountain", "panorama", "scenery", "scenic", " sea ", "seascape",
                "ocean", "beach", "coast", "forest", " woods ", " sky ", "sunset", "sunrise",
                "horizon", "valley", " hill", "meadow", " field ", " lake", "river",
                "waterfall", "desert", "canyon", "glacier", "outdoor", " nature ",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Travel,
            &[
                "travel", "tourism", "tourist", "landmark", "monument", "vacation",
                "sightseeing", "destination", " paris ", " london ", "new york", " rome ",
                " tokyo ", "venice", "barcelona", "eiffel tower", "colosseum", "passport",
                "luggage", "suitcase",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::BuildingsAndArchitecture,
            &[
                "architecture", "architectural", "building", "skyscraper", "facade",
                "interior design", " house ", " houses ", "skyline", "apartment", " bridge ",
                " tower ",
            ],
            &["travel", "tourism", "tourist", "landmark", "vacation"],
        ),
        CategoryRule::new(
            Category::People,
            &[
                "portrait", "person", "people", " man ", " men ", "woman", "women", " girl",
                " boy ", " boys ", "child", "children", " kid", "family", " face ", "selfie",
                "couple", "senior", "teenager", "crowd",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Lifestyle,
            &[
                "lifestyle", "daily life", "everyday", "routine", " at home", " home ",
                "living room", "bedroom", "kitchen", "relaxing", "cozy", "weekend",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Business,
            &[
                "business", "office", "corporate", "finance", "financial", "meeting",
                "entrepreneur", "startup", "marketing", "economy", " money ", "investment",
                "stock market", "teamwork", "workplace", "presentation", "banking",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Food,
            &[
                "food", " meal", "cooking", "dish", "cuisine", "recipe", "breakfast", "lunch",
                "dinner", "dessert", "pizza", "burger", "salad", "pasta", "bread", "fruit",
                "vegetable", "restaurant", "baking", " cake", " hot dog", "hotdog",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Drinks,
            &[
                "drink", "beverage", "coffee", " tea ", "wine", " beer", "cocktail", "juice",
                "smoothie", "latte", "espresso", "whiskey", " soda ", "lemonade",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Sports,
            &[
                "sport", "fitness", "training", "workout", " gym ", "football", "soccer",
                "basketball", "tennis", " golf", "running", "marathon", "cycling", " yoga",
                "swimming", "athlete", "stadium", "boxing", "hockey", "baseball", "volleyball",
                " ski ", "skiing",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Technology,
            &[
                "technology", " tech ", "device", "digital", "computer", "laptop",
                "smartphone", " phone", "tablet", "artificial intelligence", " ai ", "robot",
                "software", "internet", "circuit", " data ", "cyber", "virtual reality",
                "gadget", "electronics",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::GraphicResources,
            &[
                "pattern", "texture", "template", "abstract", "seamless", "wallpaper",
                " vector", "mockup", "gradient", "geometric", "illustration",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Industry,
            &[
                "factory", "manufacturing", "industrial", "industry", "warehouse", "machinery",
                "assembly line", "welding", " steel", " power plant", "refinery",
                "construction site", "engineering", "production line", "logistics",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Environment,
            &[
                "pollution", "climate", "recycling", "recycle", "environment", "ecology",
                "sustainab", "renewable", "solar panel", "wind turbine", "global warming",
                " carbon", "deforestation", "plastic waste", "conservation", "green energy",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::SocialIssues,
            &[
                "protest", "poverty", "inequality", "homeless", "discrimination", "racism",
                "refugee", "unemployment", "activism", "demonstration", "human rights",
                "charity", "volunteer", "equality", "social issue",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::Science,
            &[
                "science", "scientific", "laboratory", " lab ", "experiment", "molecule",
                "microscope", "chemistry", "physics", "biology", "research", " dna ",
                "test tube", "astronomy", " atom",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::CultureAndReligion,
            &[
                "religion", "religious", "church", "cathedral", "temple", "mosque", "prayer",
                "buddha", "christmas", "easter", "ramadan", "diwali", "festival", "tradition",
                "ceremony", "culture", "cultural", "spiritual", "worship",
            ],
            &[],
        ),
        CategoryRule::new(
            Category::HobbiesAndLeisure,
            &[
                "hobby", "hobbies", " craft", "handcraft", "gaming", "video game", "board game",
                "knitting", "painting", "drawing", "gardening", "fishing", "camping",
                "photography", "music", "guitar", " reading", "puzzle", " diy ", "collecting",
                "leisure",
            ],
            &[],
        ),
    ]
}
