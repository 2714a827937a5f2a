//! # Data Loader Crate
//!
//! This crate reads the business, review and user datasets (plus the
//! auxiliary pandemic-features dataset) and defines the shared data model.
//!
//! ## Main Components
//!
//! - **types**: Raw records, parsed entities and the `RatingMatrix`
//! - **parser**: Lazy line-delimited JSON reading and timestamp parsing
//! - **dataset**: Where the datasets live and typed openers for each
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DatasetPaths;
//! use std::path::Path;
//!
//! let paths = DatasetPaths::from_dir(Path::new("data/yelp_dataset"));
//! for record in paths.businesses()? {
//!     let record = record?;
//!     println!("{} ({} reviews)", record.name, record.review_count);
//! }
//! ```

// Public modules
pub mod dataset;
pub mod error;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use dataset::{DatasetPaths, FileRecords};
pub use error::{DataLoadError, Result};
pub use parser::{open_records, parse_timestamp, JsonLines};
pub use types::{
    // Type aliases
    BusinessId,
    UserId,
    // Raw records
    BusinessRecord,
    CovidRecord,
    ReviewRecord,
    UserRecord,
    // Parsed entities
    Business,
    Review,
    RatingMatrix,
};
