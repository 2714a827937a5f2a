//! Category and popularity selection of businesses.
//!
//! This is the first stage of the pipeline: it decides which businesses the
//! rating matrix may contain at all.

use anyhow::Result;
use data_loader::{Business, BusinessId, BusinessRecord};
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};

/// Selects businesses by category substring and minimum review count.
///
/// ## Algorithm
/// A record is kept iff
/// 1. its category string is present and non-empty,
/// 2. the lower-cased category string contains the lower-cased target as a
///    substring (so "bar" also matches "Barbeque"), and
/// 3. its `review_count` is at least `min_reviews`.
#[derive(Debug, Clone)]
pub struct BusinessFilter {
    category: String,
    min_reviews: u32,
}

impl BusinessFilter {
    /// Create a new BusinessFilter with the default minimum of 10 reviews.
    pub fn new(category: &str) -> Self {
        Self {
            category: category.to_lowercase(),
            min_reviews: 10,
        }
    }

    /// Configure the inclusive minimum review count (default: 10)
    pub fn with_min_reviews(mut self, min_reviews: u32) -> Self {
        self.min_reviews = min_reviews;
        self
    }

    pub fn matches(&self, record: &BusinessRecord) -> bool {
        match record.categories.as_deref() {
            Some(categories) if !categories.is_empty() => {
                categories.to_lowercase().contains(&self.category)
                    && record.review_count >= self.min_reviews
            }
            _ => false,
        }
    }

    /// Scan business records and collect the matching ones.
    ///
    /// Fails on the first malformed record. Later records with an
    /// identifier (or name) already seen replace the earlier entry.
    #[instrument(skip_all, fields(category = %self.category, min_reviews = self.min_reviews))]
    pub fn apply<I>(&self, records: I) -> Result<BusinessSelection>
    where
        I: IntoIterator<Item = data_loader::Result<BusinessRecord>>,
    {
        let mut selection = BusinessSelection::default();
        let mut scanned = 0usize;

        for record in records {
            let record = record?;
            scanned += 1;
            if !self.matches(&record) {
                continue;
            }
            selection
                .name_to_id
                .insert(record.name.clone(), record.business_id.clone());
            selection
                .businesses
                .insert(record.business_id.clone(), Business::from(record));
        }

        info!(
            "Selected {} of {} businesses",
            selection.businesses.len(),
            scanned
        );
        Ok(selection)
    }
}

/// Businesses kept by the filter, keyed by identifier, plus a name lookup.
///
/// `name_to_id` is lossy when businesses share a name: the last one scanned
/// wins.
#[derive(Debug, Clone, Default)]
pub struct BusinessSelection {
    pub businesses: HashMap<BusinessId, Business>,
    pub name_to_id: HashMap<String, BusinessId>,
}

impl BusinessSelection {
    pub fn len(&self) -> usize {
        self.businesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty()
    }

    pub fn get(&self, business_id: &str) -> Option<&Business> {
        self.businesses.get(business_id)
    }

    pub fn id_for_name(&self, name: &str) -> Option<&BusinessId> {
        self.name_to_id.get(name)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Business> {
        self.id_for_name(name).and_then(|id| self.get(id))
    }

    /// Identifier set used to join reviews against the selection
    pub fn ids(&self) -> HashSet<BusinessId> {
        self.businesses.keys().cloned().collect()
    }
}
