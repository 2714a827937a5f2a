//! Construction of the business x user rating matrix.
//!
//! ## Algorithm
//! 1. Scan reviews, keeping only those of selected businesses (dates are
//!    parsed for these only)
//! 2. `RecencyFilter`: keep reviews dated after `start_date`
//! 3. `DeduplicateFilter`: one review per (business, user), last scanned wins
//! 4. `MinimumActivityFilter` on users, then on businesses
//!    (once, or to a fixed point, depending on `ThresholdPolicy`)
//! 5. Pivot the survivors into a dense grid, 0 for "no rating"

use crate::config::ThresholdPolicy;
use crate::filter_pipeline::ReviewPipeline;
use crate::filters::{DeduplicateFilter, FixedPointFilter, MinimumActivityFilter, RecencyFilter};
use anyhow::Result;
use chrono::NaiveDate;
use data_loader::{BusinessId, RatingMatrix, Review, ReviewRecord};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Builds a `RatingMatrix` from a review stream.
#[derive(Debug, Clone)]
pub struct RatingMatrixBuilder {
    threshold: usize,
    policy: ThresholdPolicy,
}

impl RatingMatrixBuilder {
    /// Create a builder with the given minimum reviews per user and business
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            policy: ThresholdPolicy::OneShot,
        }
    }

    /// Configure how the activity thresholds are applied (default: one shot)
    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The review filters applied after the business join, in order
    pub fn review_pipeline(&self, start_date: NaiveDate) -> ReviewPipeline {
        let pipeline = ReviewPipeline::new()
            .add_filter(RecencyFilter::new(start_date))
            .add_filter(DeduplicateFilter);

        match self.policy {
            ThresholdPolicy::OneShot => pipeline
                .add_filter(MinimumActivityFilter::users(self.threshold))
                .add_filter(MinimumActivityFilter::businesses(self.threshold)),
            ThresholdPolicy::FixedPoint => {
                let activity = ReviewPipeline::new()
                    .add_filter(MinimumActivityFilter::users(self.threshold))
                    .add_filter(MinimumActivityFilter::businesses(self.threshold));
                pipeline.add_filter(FixedPointFilter::new(activity))
            }
        }
    }

    /// Build the matrix.
    ///
    /// Fails on the first malformed review of a selected business. An empty
    /// stream, or one where nothing survives the thresholds, yields an empty
    /// matrix.
    #[instrument(skip_all, fields(threshold = self.threshold, policy = ?self.policy))]
    pub fn build<I>(
        &self,
        reviews: I,
        business_ids: &HashSet<BusinessId>,
        start_date: NaiveDate,
    ) -> Result<RatingMatrix>
    where
        I: IntoIterator<Item = data_loader::Result<ReviewRecord>>,
    {
        let mut joined: Vec<Review> = Vec::new();
        let mut scanned = 0usize;
        for record in reviews {
            let record = record?;
            scanned += 1;
            if business_ids.contains(&record.business_id) {
                joined.push(record.into_review()?);
            }
        }
        info!(
            "Joined {} of {} reviews against {} businesses",
            joined.len(),
            scanned,
            business_ids.len()
        );

        let survivors = self.review_pipeline(start_date).apply(joined)?;

        let matrix = RatingMatrix::from_triples(
            survivors
                .iter()
                .map(|r| (r.business_id.as_str(), r.user_id.as_str(), r.stars)),
        );
        let (rows, cols) = matrix.shape();
        info!(
            "Rating matrix: {} businesses x {} users, density {:.5}",
            rows,
            cols,
            matrix.density()
        );
        Ok(matrix)
    }
}

impl Default for RatingMatrixBuilder {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::review_line;
    use data_loader::{DataLoadError, JsonLines};
    use std::io::Cursor;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 12, 31).unwrap()
    }

    fn ids(ids: &[&str]) -> HashSet<BusinessId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn stream(lines: &[String]) -> JsonLines<Cursor<String>, ReviewRecord> {
        JsonLines::new(Cursor::new(lines.join("\n")), "review")
    }

    /// Every user in `users` reviews every business in `businesses`
    fn grid(businesses: &[&str], users: &[&str], stars: f32) -> Vec<String> {
        let mut lines = Vec::new();
        for b in businesses {
            for u in users {
                lines.push(review_line(b, u, stars, "2019-03-01 12:00:00"));
            }
        }
        lines
    }

    #[test]
    fn test_dedup_keeps_last_scanned() {
        let lines = vec![
            review_line("B1", "U1", 5.0, "2019-06-01 00:00:00"),
            review_line("B1", "U1", 2.0, "2019-01-01 00:00:00"),
        ];

        let matrix = RatingMatrixBuilder::new(1)
            .build(stream(&lines), &ids(&["B1"]), start())
            .unwrap();

        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.get("B1", "U1"), Some(2.0));
    }

    #[test]
    fn test_dedup_applies_after_date_filter() {
        // The later line is before the cutoff, so the earlier line survives
        let lines = vec![
            review_line("B1", "U1", 4.0, "2019-06-01 00:00:00"),
            review_line("B1", "U1", 1.0, "2018-01-01 00:00:00"),
        ];

        let matrix = RatingMatrixBuilder::new(1)
            .build(stream(&lines), &ids(&["B1"]), start())
            .unwrap();

        assert_eq!(matrix.get("B1", "U1"), Some(4.0));
    }

    #[test]
    fn test_unselected_businesses_ignored() {
        let mut lines = grid(&["B1", "B2"], &["U1", "U2"], 4.0);
        // Unparseable date on a business we never select is never looked at
        lines.push(review_line("B9", "U1", 3.0, "not a date"));

        let matrix = RatingMatrixBuilder::new(2)
            .build(stream(&lines), &ids(&["B1", "B2"]), start())
            .unwrap();

        assert_eq!(matrix.shape(), (2, 2));
        assert!(!matrix.contains_business("B9"));
    }

    #[test]
    fn test_thresholds_respected() {
        let mut lines = grid(&["B1", "B2", "B3"], &["U1", "U2", "U3"], 4.0);
        // U4 is too quiet, B4 too obscure
        lines.push(review_line("B1", "U4", 5.0, "2019-03-01 12:00:00"));
        lines.push(review_line("B4", "U1", 5.0, "2019-03-01 12:00:00"));

        let matrix = RatingMatrixBuilder::new(3)
            .build(stream(&lines), &ids(&["B1", "B2", "B3", "B4"]), start())
            .unwrap();

        assert_eq!(matrix.shape(), (3, 3));
        assert!(!matrix.contains_user("U4"));
        assert!(!matrix.contains_business("B4"));
        for row in 0..3 {
            assert!(matrix.nnz_in_row(row) >= 3);
        }
        for col in 0..3 {
            assert!(matrix.nnz_in_column(col) >= 3);
        }
    }

    #[test]
    fn test_one_shot_can_leave_sparse_users() {
        // U3 passes the user filter with 2 reviews, then loses B3
        let mut lines = grid(&["B1", "B2"], &["U1", "U2"], 4.0);
        lines.push(review_line("B1", "U3", 3.0, "2019-03-01 12:00:00"));
        lines.push(review_line("B3", "U3", 3.0, "2019-03-01 12:00:00"));

        let business_ids = ids(&["B1", "B2", "B3"]);

        let one_shot = RatingMatrixBuilder::new(2)
            .build(stream(&lines), &business_ids, start())
            .unwrap();
        assert_eq!(one_shot.shape(), (2, 3));
        let u3 = one_shot.user_position("U3").unwrap();
        assert_eq!(one_shot.nnz_in_column(u3), 1);

        let fixed = RatingMatrixBuilder::new(2)
            .with_policy(ThresholdPolicy::FixedPoint)
            .build(stream(&lines), &business_ids, start())
            .unwrap();
        assert_eq!(fixed.shape(), (2, 2));
        assert!(!fixed.contains_user("U3"));
    }

    #[test]
    fn test_empty_results_are_not_errors() {
        let empty = RatingMatrixBuilder::default()
            .build(stream(&[]), &ids(&["B1"]), start())
            .unwrap();
        assert!(empty.is_empty());

        let lines = grid(&["B1"], &["U1"], 4.0);
        let thresholded = RatingMatrixBuilder::default()
            .build(stream(&lines), &ids(&["B1"]), start())
            .unwrap();
        assert_eq!(thresholded.shape(), (0, 0));
    }

    #[test]
    fn test_bad_date_on_selected_business_fails() {
        let lines = vec![review_line("B1", "U1", 3.0, "soon")];

        let err = RatingMatrixBuilder::new(1)
            .build(stream(&lines), &ids(&["B1"]), start())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataLoadError>(),
            Some(DataLoadError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rebuild_is_identical() {
        let mut lines = grid(&["B3", "B1", "B2"], &["U2", "U1"], 4.0);
        lines.push(review_line("B2", "U1", 1.0, "2019-05-01 00:00:00"));
        let business_ids = ids(&["B1", "B2", "B3"]);

        let first = RatingMatrixBuilder::new(2)
            .build(stream(&lines), &business_ids, start())
            .unwrap();
        let second = RatingMatrixBuilder::new(2)
            .build(stream(&lines), &business_ids, start())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.business_ids(), &["B1", "B2", "B3"]);
        assert_eq!(first.get("B2", "U1"), Some(1.0));
    }
}
