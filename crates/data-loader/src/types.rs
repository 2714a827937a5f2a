//! Core domain types for the review dataset.
//!
//! Two layers live here:
//! - raw records (`*Record`), one per JSON line, deserialized with serde and
//!   holding exactly the fields the pipeline reads
//! - parsed entities (`Business`, `Review`) and the `RatingMatrix` that the
//!   pipeline produces and the neighbor index consumes

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::parser::parse_timestamp;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque 22-character business identifier
pub type BusinessId = String;

/// Opaque 22-character user identifier
pub type UserId = String;

// =============================================================================
// Raw Records
// =============================================================================

/// One line of the business dataset.
///
/// Unknown fields (`hours`, `is_open`, ...) are ignored. `attributes` and
/// `categories` are nullable in the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_id: BusinessId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stars: f64,
    pub review_count: u32,
    pub attributes: Option<Map<String, Value>>,
    pub categories: Option<String>,
}

/// One line of the review dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub user_id: UserId,
    pub business_id: BusinessId,
    pub stars: f32,
    pub date: String,
}

/// One line of the user dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub review_count: u32,
    pub yelping_since: String,
    /// Comma and space separated friend ids, or the literal "None"
    pub friends: String,
    pub useful: u64,
    pub funny: u64,
    pub cool: u64,
    pub fans: u64,
    /// Comma separated elite years, empty when never elite
    pub elite: String,
    pub compliment_hot: u64,
    pub compliment_more: u64,
    pub compliment_profile: u64,
    pub compliment_cute: u64,
    pub compliment_list: u64,
    pub compliment_note: u64,
    pub compliment_plain: u64,
    pub compliment_cool: u64,
    pub compliment_funny: u64,
    pub compliment_writer: u64,
    pub compliment_photos: u64,
}

/// One line of the auxiliary pandemic-features dataset.
///
/// The flag fields are kept as raw JSON values: `highlights` is usually a
/// JSON-encoded string and only the exact string `"FALSE"` means "absent".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovidRecord {
    pub business_id: BusinessId,
    pub highlights: Value,
    #[serde(rename = "delivery or takeout")]
    pub delivery_or_takeout: Value,
}

/// Sentinel the auxiliary dataset uses for "feature absent"
pub const ABSENT_SENTINEL: &str = "FALSE";

impl CovidRecord {
    pub fn has_highlights(&self) -> bool {
        !is_absent(&self.highlights)
    }

    pub fn offers_delivery_or_takeout(&self) -> bool {
        !is_absent(&self.delivery_or_takeout)
    }
}

fn is_absent(value: &Value) -> bool {
    matches!(value, Value::String(s) if s == ABSENT_SENTINEL)
}

// =============================================================================
// Parsed Entities
// =============================================================================

/// A business selected by the category filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub business_id: BusinessId,
    pub name: String,
    /// `"{address} {city} {state} {postal_code}"`
    pub address: String,
    /// (latitude, longitude)
    pub coordinate: (f64, f64),
    pub stars: f64,
    pub review_count: u32,
    pub attributes: Map<String, Value>,
    pub categories: Option<String>,
    pub state: String,
}

impl From<BusinessRecord> for Business {
    fn from(record: BusinessRecord) -> Self {
        let address = format!(
            "{} {} {} {}",
            record.address, record.city, record.state, record.postal_code
        );
        Self {
            business_id: record.business_id,
            name: record.name,
            address,
            coordinate: (record.latitude, record.longitude),
            stars: record.stars,
            review_count: record.review_count,
            attributes: record.attributes.unwrap_or_default(),
            categories: record.categories,
            state: record.state,
        }
    }
}

impl fmt::Display for Business {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Address: {}", self.address)?;
        writeln!(f, "Coordinate: ({}, {})", self.coordinate.0, self.coordinate.1)?;
        writeln!(f, "Stars: {}", self.stars)?;
        write!(f, "Categories: {}", self.categories.as_deref().unwrap_or("None"))
    }
}

/// A review with its date parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: UserId,
    pub business_id: BusinessId,
    /// Star rating from 1.0 to 5.0
    pub stars: f32,
    pub date: NaiveDateTime,
}

impl ReviewRecord {
    /// Parse the date field, consuming the record.
    pub fn into_review(self) -> Result<Review> {
        let date = parse_timestamp("date", &self.date)?;
        Ok(Review {
            user_id: self.user_id,
            business_id: self.business_id,
            stars: self.stars,
            date,
        })
    }
}

// =============================================================================
// RatingMatrix
// =============================================================================

/// Dense business x user grid of star ratings.
///
/// Rows are businesses and columns are users, both sorted by identifier.
/// A cell of `0.0` means "no rating". Cells are stored row-major.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RatingMatrix {
    businesses: Vec<BusinessId>,
    users: Vec<UserId>,
    cells: Vec<f32>,
    business_pos: HashMap<BusinessId, usize>,
    user_pos: HashMap<UserId, usize>,
}

impl RatingMatrix {
    /// Pivot `(business, user, stars)` triples into a dense grid.
    ///
    /// Each pair must appear at most once; a repeated pair keeps the later
    /// value.
    pub fn from_triples<'a, I>(triples: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, f32)>,
    {
        let triples: Vec<(&str, &str, f32)> = triples.into_iter().collect();

        let mut businesses: Vec<BusinessId> =
            triples.iter().map(|(b, _, _)| b.to_string()).collect();
        businesses.sort_unstable();
        businesses.dedup();

        let mut users: Vec<UserId> = triples.iter().map(|(_, u, _)| u.to_string()).collect();
        users.sort_unstable();
        users.dedup();

        let business_pos: HashMap<BusinessId, usize> = businesses
            .iter()
            .enumerate()
            .map(|(i, b)| (b.clone(), i))
            .collect();
        let user_pos: HashMap<UserId, usize> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.clone(), i))
            .collect();

        let n_cols = users.len();
        let mut cells = vec![0.0; businesses.len() * n_cols];
        for (business, user, stars) in triples {
            let row = business_pos[business];
            let col = user_pos[user];
            cells[row * n_cols + col] = stars;
        }

        Self {
            businesses,
            users,
            cells,
            business_pos,
            user_pos,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.businesses.len(), self.users.len())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Business identifiers labelling the rows, in row order
    pub fn business_ids(&self) -> &[BusinessId] {
        &self.businesses
    }

    /// User identifiers labelling the columns, in column order
    pub fn user_ids(&self) -> &[UserId] {
        &self.users
    }

    pub fn business_position(&self, business_id: &str) -> Option<usize> {
        self.business_pos.get(business_id).copied()
    }

    pub fn user_position(&self, user_id: &str) -> Option<usize> {
        self.user_pos.get(user_id).copied()
    }

    pub fn contains_business(&self, business_id: &str) -> bool {
        self.business_pos.contains_key(business_id)
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_pos.contains_key(user_id)
    }

    /// Rating at (business, user), `None` when either label is unknown
    pub fn get(&self, business_id: &str, user_id: &str) -> Option<f32> {
        let row = self.business_position(business_id)?;
        let col = self.user_position(user_id)?;
        Some(self.cells[row * self.users.len() + col])
    }

    /// The rating vector of one business across all users
    pub fn row(&self, row: usize) -> &[f32] {
        let n_cols = self.users.len();
        &self.cells[row * n_cols..(row + 1) * n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        let n_cols = self.users.len().max(1);
        self.cells.chunks_exact(n_cols)
    }

    pub fn nnz_in_row(&self, row: usize) -> usize {
        self.row(row).iter().filter(|&&v| v != 0.0).count()
    }

    pub fn nnz_in_column(&self, col: usize) -> usize {
        self.rows().filter(|row| row[col] != 0.0).count()
    }

    /// Number of non-zero cells
    pub fn nnz(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0.0).count()
    }

    /// Fraction of cells holding a rating
    pub fn density(&self) -> f64 {
        if self.cells.is_empty() {
            0.0
        } else {
            self.nnz() as f64 / self.cells.len() as f64
        }
    }
}
