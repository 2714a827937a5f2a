//! Locations of the review datasets and typed openers for each.

use crate::error::Result;
use crate::parser::{open_records, JsonLines};
use crate::types::{BusinessRecord, CovidRecord, ReviewRecord, UserRecord};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

pub const BUSINESS_FILE: &str = "yelp_academic_dataset_business.json";
pub const REVIEW_FILE: &str = "yelp_academic_dataset_review.json";
pub const USER_FILE: &str = "yelp_academic_dataset_user.json";
pub const COVID_FILE: &str = "covid_19_dataset_2020_06_10/yelp_academic_dataset_covid_features.json";

/// Lazy record sequence backed by a file
pub type FileRecords<T> = JsonLines<BufReader<File>, T>;

/// Paths to the three primary datasets plus the optional auxiliary one.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub business: PathBuf,
    pub review: PathBuf,
    pub user: PathBuf,
    pub covid: Option<PathBuf>,
}

impl DatasetPaths {
    /// Resolve the canonical file names inside `data_dir`.
    ///
    /// The auxiliary pandemic dataset is only picked up when it exists on
    /// disk, either inside `data_dir` or next to it:
    ///
    /// ```text
    /// data/yelp_dataset/yelp_academic_dataset_business.json
    /// data/covid_19_dataset_2020_06_10/yelp_academic_dataset_covid_features.json
    /// ```
    pub fn from_dir(data_dir: &Path) -> Self {
        let covid = std::iter::once(data_dir)
            .chain(data_dir.parent())
            .map(|dir| dir.join(COVID_FILE))
            .find(|path| path.exists());
        Self {
            business: data_dir.join(BUSINESS_FILE),
            review: data_dir.join(REVIEW_FILE),
            user: data_dir.join(USER_FILE),
            covid,
        }
    }

    /// Override (or clear) the auxiliary dataset path
    pub fn with_covid(mut self, covid: Option<PathBuf>) -> Self {
        self.covid = covid;
        self
    }

    pub fn businesses(&self) -> Result<FileRecords<BusinessRecord>> {
        open_records(&self.business)
    }

    pub fn reviews(&self) -> Result<FileRecords<ReviewRecord>> {
        open_records(&self.review)
    }

    pub fn users(&self) -> Result<FileRecords<UserRecord>> {
        open_records(&self.user)
    }

    /// `None` when no auxiliary dataset is configured
    pub fn covid_features(&self) -> Option<Result<FileRecords<CovidRecord>>> {
        self.covid.as_deref().map(open_records)
    }
}
