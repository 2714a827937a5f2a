//! Filter to ensure a minimum number of reviews per user or per business.
//!
//! Removes every review belonging to a user (or business) that has fewer
//! than `threshold` reviews in the current set.

use crate::traits::ReviewFilter;
use anyhow::Result;
use data_loader::Review;
use std::collections::HashMap;

/// Which side of the rating matrix a count is taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAxis {
    User,
    Business,
}

impl ActivityAxis {
    fn key<'a>(&self, review: &'a Review) -> &'a str {
        match self {
            ActivityAxis::User => review.user_id.as_str(),
            ActivityAxis::Business => review.business_id.as_str(),
        }
    }
}

/// Removes reviews of users or businesses below the activity threshold.
///
/// ## Algorithm
/// 1. Count reviews per key (user or business) in the input
/// 2. Keep a review only if its key has count >= threshold
pub struct MinimumActivityFilter {
    axis: ActivityAxis,
    threshold: usize,
}

impl MinimumActivityFilter {
    pub fn new(axis: ActivityAxis, threshold: usize) -> Self {
        Self { axis, threshold }
    }

    /// Drop users with fewer than `threshold` reviews
    pub fn users(threshold: usize) -> Self {
        Self::new(ActivityAxis::User, threshold)
    }

    /// Drop businesses with fewer than `threshold` reviews
    pub fn businesses(threshold: usize) -> Self {
        Self::new(ActivityAxis::Business, threshold)
    }
}

impl ReviewFilter for MinimumActivityFilter {
    fn name(&self) -> &str {
        match self.axis {
            ActivityAxis::User => "MinimumActivityFilter(user)",
            ActivityAxis::Business => "MinimumActivityFilter(business)",
        }
    }

    fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for review in &reviews {
            *counts.entry(self.axis.key(review)).or_insert(0) += 1;
        }
        let keep: Vec<bool> = reviews
            .iter()
            .map(|review| counts[self.axis.key(review)] >= self.threshold)
            .collect();

        let filtered: Vec<Review> = reviews
            .into_iter()
            .zip(keep)
            .filter_map(|(review, keep)| keep.then_some(review))
            .collect();

        Ok(filtered)
    }
}
