//! The ReviewPipeline orchestrates multiple review filters.
//!
//! This module provides the ReviewPipeline struct that chains
//! filters together using the builder pattern.

use crate::traits::ReviewFilter;
use anyhow::Result;
use data_loader::Review;
use tracing;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = ReviewPipeline::new()
///     .add_filter(RecencyFilter::new(start_date))
///     .add_filter(DeduplicateFilter)
///     .add_filter(MinimumActivityFilter::users(10));
///
/// let reviews = pipeline.apply(reviews)?;
/// ```
pub struct ReviewPipeline {
    filters: Vec<Box<dyn ReviewFilter>>,
}

impl ReviewPipeline {
    /// Create a new empty ReviewPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl ReviewFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the reviews.
    ///
    /// ## Algorithm
    /// 1. Start with the input reviews
    /// 2. For each filter in order:
    ///    a. Log filter name and input count
    ///    b. Apply the filter
    ///    c. Log output count
    /// 3. Return final filtered set
    pub fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>> {
        let mut current = reviews;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current)?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for ReviewPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::DeduplicateFilter;
    use crate::test_support::review;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = ReviewPipeline::new();
        assert!(pipeline.is_empty());

        let reviews = vec![
            review("b1", "u1", 4.0, "2019-01-01"),
            review("b1", "u1", 5.0, "2019-02-01"),
        ];

        let filtered = pipeline.apply(reviews).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let pipeline = ReviewPipeline::new().add_filter(DeduplicateFilter);
        assert_eq!(pipeline.len(), 1);

        let reviews = vec![
            review("b1", "u1", 4.0, "2019-01-01"),
            review("b2", "u1", 3.0, "2019-01-05"),
            review("b1", "u1", 5.0, "2019-02-01"),
        ];

        let filtered = pipeline.apply(reviews).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].business_id, "b2");
        assert_eq!(filtered[1].stars, 5.0);
    }
}
