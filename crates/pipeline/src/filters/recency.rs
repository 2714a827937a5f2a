//! Filter for the review date cutoff.
//!
//! Only reviews written after the start of the sampling window count
//! towards the rating matrix.

use crate::traits::ReviewFilter;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use data_loader::Review;

/// Keeps reviews dated strictly after midnight of `start_date`.
///
/// A review at exactly `start_date 00:00:00` is dropped; any later time on
/// the same day is kept.
pub struct RecencyFilter {
    cutoff: NaiveDateTime,
}

impl RecencyFilter {
    /// Create a new RecencyFilter.
    ///
    /// # Arguments
    /// * `start_date` - Reviews must be dated after the start of this day
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            cutoff: start_date.and_time(NaiveTime::MIN),
        }
    }
}

impl ReviewFilter for RecencyFilter {
    fn name(&self) -> &str {
        "RecencyFilter"
    }

    fn apply(&self, reviews: Vec<Review>) -> Result<Vec<Review>> {
        let filtered: Vec<Review> = reviews
            .into_iter()
            .filter(|review| review.date > self.cutoff)
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::review;

    #[test]
    fn test_recency_filter() {
        let reviews = vec![
            review("b1", "u1", 4.0, "2018-12-30 23:59:59"), // before
            review("b1", "u2", 4.0, "2018-12-31"),          // exactly the cutoff
            review("b1", "u3", 4.0, "2018-12-31 00:00:01"), // same day, later
            review("b1", "u4", 4.0, "2019-06-01 12:00:00"),
        ];

        let filter = RecencyFilter::new(NaiveDate::from_ymd_opt(2018, 12, 31).unwrap());
        let filtered = filter.apply(reviews).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].user_id, "u3");
        assert_eq!(filtered[1].user_id, "u4");
    }
}
