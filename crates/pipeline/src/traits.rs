//! Core traits for the review filtering pipeline.
//!
//! This module defines the ReviewFilter trait that allows composable
//! filters to be applied to the reviews feeding the rating matrix.

use anyhow::Result;
use data_loader::Review;

/// Core trait for filtering reviews.
///
/// All filters must implement this trait to be used in the ReviewPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be nested inside other filters
/// - Filters take ownership of the Vec<Review> and return a filtered Vec
/// - Survivors keep their scan order; several filters depend on it
pub trait ReviewFilter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of reviews.
    ///
    /// # Arguments
    /// * `reviews` - The reviews to filter (takes ownership), in scan order
    ///
    /// # Returns
    /// * `Ok(Vec<Review>)` - The surviving reviews, still in scan order
    /// * `Err` - If filtering fails
    fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>>;
}
