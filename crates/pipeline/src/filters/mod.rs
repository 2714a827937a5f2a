//! Filter implementations for the review pipeline.
//!
//! This module contains all the concrete filters that are composed
//! into a ReviewPipeline to build the rating matrix.

pub mod deduplicate;
pub mod fixed_point;
pub mod minimum_activity;
pub mod recency;

// Re-export for convenience
pub use deduplicate::DeduplicateFilter;
pub use fixed_point::FixedPointFilter;
pub use minimum_activity::{ActivityAxis, MinimumActivityFilter};
pub use recency::RecencyFilter;
