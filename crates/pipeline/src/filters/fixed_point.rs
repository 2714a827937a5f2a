//! Repeats a filter chain until it stops removing reviews.

use crate::filter_pipeline::ReviewPipeline;
use crate::traits::ReviewFilter;
use anyhow::Result;
use data_loader::Review;

/// Applies an inner pipeline until the review count stops changing.
///
/// Filters only ever remove reviews, so an unchanged count means an
/// unchanged set.
pub struct FixedPointFilter {
    inner: ReviewPipeline,
}

impl FixedPointFilter {
    pub fn new(inner: ReviewPipeline) -> Self {
        Self { inner }
    }
}

impl ReviewFilter for FixedPointFilter {
    fn name(&self) -> &str {
        "FixedPointFilter"
    }

    fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>> {
        let mut current = reviews;
        let mut rounds = 0usize;
        loop {
            let before = current.len();
            current = self.inner.apply(current)?;
            rounds += 1;
            if current.len() == before {
                break;
            }
        }
        tracing::debug!("Fixed point reached after {} rounds", rounds);
        Ok(current)
    }
}
