//! Pipeline configuration.
//!
//! Everything has a default so a JSON config file only needs to name the
//! fields it changes:
//!
//! ```json
//! { "category": "restaurants", "start_date": "2018-12-31", "threshold_policy": "fixed_point" }
//! ```

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Most frequent category labels, lower-case
pub const TOP_LABELS: [&str; 25] = [
    "restaurants",
    "nightlife",
    "bars",
    "food",
    "american (traditional)",
    "american (new)",
    "sushi bars",
    "cocktail bars",
    "japanese",
    "sports bars",
    "pubs",
    "barbeque",
    "breakfast & brunch",
    "juice bars & smoothies",
    "wine bars",
    "burgers",
    "seafood",
    "sandwiches",
    "lounges",
    "asian fusion",
    "steakhouses",
    "coffee & tea",
    "wine & spirits",
    "beer",
    "event planning & services",
];

/// States and provinces with enough businesses to get their own column
pub const TOP_STATES: [&str; 9] = ["AZ", "NV", "ON", "OH", "NC", "PA", "QC", "AB", "WI"];

/// State bucket for businesses outside `Taxonomy::states`
pub const OTHER_STATE: &str = "Other_State";

/// Category labels and states that get their own one-hot columns.
///
/// Deserialized taxonomies go through `Taxonomy::new`, so labels from a
/// config file are lower-cased too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaxonomyFields")]
pub struct Taxonomy {
    pub labels: Vec<String>,
    pub states: Vec<String>,
}

impl Taxonomy {
    /// Labels are lower-cased so they compare against lower-cased category lists.
    pub fn new<L, S>(labels: L, states: S) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        Self {
            labels: labels.into_iter().map(|l| l.as_ref().to_lowercase()).collect(),
            states: states.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Column position of a (lower-case) category label
    pub fn label_position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// The record's state if it is a top state, otherwise `Other_State`
    pub fn state_bucket<'a>(&'a self, state: &'a str) -> &'a str {
        if self.states.iter().any(|s| s == state) {
            state
        } else {
            OTHER_STATE
        }
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for label in &self.labels {
            if label.contains(',') {
                bail!("category label {:?} must not contain a comma", label);
            }
            if !seen.insert(label.as_str()) {
                bail!("category label {:?} is listed twice", label);
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct TaxonomyFields {
    labels: Vec<String>,
    states: Vec<String>,
}

impl From<TaxonomyFields> for Taxonomy {
    fn from(fields: TaxonomyFields) -> Self {
        Self::new(fields.labels, fields.states)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::new(TOP_LABELS, TOP_STATES)
    }
}

/// How the minimum-activity thresholds are applied to the rating matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Filter users once, then businesses once. Users may end up below the
    /// threshold after businesses are removed.
    #[default]
    OneShot,
    /// Repeat both filters until neither removes anything, so every row and
    /// column meets the threshold.
    FixedPoint,
}

/// Settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Case-insensitive substring the business category list must contain
    pub category: String,
    /// Minimum `review_count` (inclusive) for a business to be selected
    pub min_reviews: u32,
    /// Only reviews strictly after midnight of this day are kept
    pub start_date: NaiveDate,
    /// Minimum reviews per user and per business in the rating matrix
    pub threshold: usize,
    pub threshold_policy: ThresholdPolicy,
    pub taxonomy: Taxonomy,
    /// Account age in `yelping_since` is measured up to this day
    pub reference_date: NaiveDate,
    /// Neighbors returned by the similarity index by default
    pub n_neighbors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            category: "bar".to_string(),
            min_reviews: 10,
            start_date: DEFAULT_START_DATE,
            threshold: 10,
            threshold_policy: ThresholdPolicy::OneShot,
            taxonomy: Taxonomy::default(),
            reference_date: DEFAULT_REFERENCE_DATE,
            n_neighbors: 20,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.category.is_empty() {
            bail!("category must not be empty");
        }
        if self.n_neighbors == 0 {
            bail!("n_neighbors must be at least 1");
        }
        self.taxonomy.validate()
    }
}

/// Const-evaluated, so an invalid literal fails the build rather than a run
const fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid calendar date"),
    }
}

/// Reviews on or before this day are ignored by default
pub const DEFAULT_START_DATE: NaiveDate = ymd(2017, 12, 31);

/// Account ages are measured up to this day by default
pub const DEFAULT_REFERENCE_DATE: NaiveDate = ymd(2020, 1, 1);
