//! Filter that leaves one review per (business, user) pair.

use crate::traits::ReviewFilter;
use anyhow::Result;
use data_loader::Review;
use std::collections::HashSet;

/// Keeps the last-scanned review of every (business, user) pair.
///
/// ## Algorithm
/// Walk the reviews back to front, keep the first occurrence of each pair,
/// then restore scan order. "Last" means last in the input order, not the
/// latest date: a user who re-reviewed a business keeps whichever line came
/// later in the file.
pub struct DeduplicateFilter;

impl ReviewFilter for DeduplicateFilter {
    fn name(&self) -> &str {
        "DeduplicateFilter"
    }

    fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>> {
        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(reviews.len());
        let mut kept: Vec<Review> = reviews
            .into_iter()
            .rev()
            .filter(|review| seen.insert((review.business_id.clone(), review.user_id.clone())))
            .collect();
        kept.reverse();
        Ok(kept)
    }
}
