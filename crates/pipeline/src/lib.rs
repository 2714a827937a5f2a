//! Pipeline for building the business recommendation features.
//!
//! This crate provides:
//! - BusinessFilter for selecting businesses by category and popularity
//! - ReviewFilter trait, filter implementations and ReviewPipeline for
//!   composing them
//! - RatingMatrixBuilder for the thresholded business x user rating matrix
//! - BusinessFeatureEncoder, UserFeatureEncoder and CovidFeatureAugmenter
//!   for the per-entity feature tables
//! - FeaturePipeline for running everything against the datasets on disk
//!
//! ## Architecture
//! Data flows strictly forward:
//! 1. BusinessFilter picks the candidate businesses
//! 2. RatingMatrixBuilder joins reviews against them and thresholds both axes
//! 3. The matrix's row and column labels drive the two feature encoders
//! 4. The matrix is handed to the cosine neighbor index for similarity lookup
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FeaturePipeline, PipelineConfig};
//! use data_loader::DatasetPaths;
//!
//! let output = FeaturePipeline::new(PipelineConfig::default())
//!     .run(&DatasetPaths::from_dir(Path::new("data/yelp_dataset")))?;
//!
//! let index = output.fit_neighbors();
//! let similar = output.similar_by_name(&index, "Some Bar", 10)?;
//! ```

pub mod business_features;
pub mod business_filter;
pub mod config;
pub mod covid;
pub mod filter_pipeline;
pub mod filters;
pub mod rating_matrix;
pub mod runner;
pub mod traits;
pub mod user_features;

// Re-export main types
pub use business_features::{BusinessFeatureEncoder, BusinessFeatureTable, BusinessFeatures, CovidFlags};
pub use business_filter::{BusinessFilter, BusinessSelection};
pub use config::{PipelineConfig, Taxonomy, ThresholdPolicy};
pub use covid::CovidFeatureAugmenter;
pub use filter_pipeline::ReviewPipeline;
pub use rating_matrix::RatingMatrixBuilder;
pub use runner::{FeaturePipeline, PipelineOutput, SimilarBusiness};
pub use traits::ReviewFilter;
pub use user_features::{UserActivity, UserFeatureEncoder, UserFeatureTable, UserFeatures};

#[cfg(test)]
pub(crate) mod test_support {
    use data_loader::{Review, parse_timestamp};
    use serde_json::json;

    pub fn review(business_id: &str, user_id: &str, stars: f32, date: &str) -> Review {
        Review {
            user_id: user_id.to_string(),
            business_id: business_id.to_string(),
            stars,
            date: parse_timestamp("date", date).unwrap(),
        }
    }

    pub fn review_line(business_id: &str, user_id: &str, stars: f32, date: &str) -> String {
        json!({
            "review_id": format!("{}-{}", business_id, user_id),
            "user_id": user_id,
            "business_id": business_id,
            "stars": stars,
            "date": date,
        })
        .to_string()
    }

    pub fn business_line(
        business_id: &str,
        name: &str,
        state: &str,
        categories: Option<&str>,
        review_count: u32,
    ) -> String {
        json!({
            "business_id": business_id,
            "name": name,
            "address": "1 Main St",
            "city": "Somewhere",
            "state": state,
            "postal_code": "00000",
            "latitude": 36.1,
            "longitude": -115.1,
            "stars": 4.0,
            "review_count": review_count,
            "is_open": 1,
            "attributes": null,
            "categories": categories,
        })
        .to_string()
    }

    pub fn user_line(user_id: &str, friends: &str, elite: &str) -> String {
        json!({
            "user_id": user_id,
            "name": "Sam",
            "review_count": 15,
            "yelping_since": "2012-05-01 10:00:00",
            "friends": friends,
            "useful": 4,
            "funny": 1,
            "cool": 2,
            "fans": 1,
            "elite": elite,
            "average_stars": 3.8,
            "compliment_hot": 0,
            "compliment_more": 0,
            "compliment_profile": 0,
            "compliment_cute": 0,
            "compliment_list": 0,
            "compliment_note": 1,
            "compliment_plain": 2,
            "compliment_cool": 0,
            "compliment_funny": 0,
            "compliment_writer": 0,
            "compliment_photos": 0,
        })
        .to_string()
    }
}
