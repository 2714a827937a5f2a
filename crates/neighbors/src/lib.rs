//! # Neighbors Crate
//!
//! Similarity lookup over the business x user rating matrix.
//!
//! ## Components
//!
//! ### NeighborIndex
//! The capability the rest of the system relies on: fit once, then ask for
//! the `k` rows closest to a query vector. Anything that can answer
//! `kneighbors` can stand in for the default index.
//!
//! ### BruteForceCosine
//! Exhaustive cosine-distance search:
//! - distance = 1 - cos(angle between rating vectors)
//! - every row is scored, so results are exact
//! - rows are scored in parallel with Rayon
//! - 20 neighbors by default
//!
//! ## Example Usage
//!
//! ```ignore
//! use neighbors::{BruteForceCosine, NeighborIndex};
//!
//! let index = BruteForceCosine::fit(&matrix);
//! for n in index.kneighbors_of_label("business-id", 10)? {
//!     println!("{} at distance {:.3}", n.label, n.distance);
//! }
//! ```

pub mod cosine;

pub use cosine::BruteForceCosine;

use anyhow::Result;

/// One result row of a neighbor query
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Row position in the fitted matrix
    pub index: usize,
    /// Row label (business identifier)
    pub label: String,
    pub distance: f64,
}

/// A fitted nearest-neighbor index over labelled vectors.
pub trait NeighborIndex: Send + Sync {
    /// Number of fitted rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension of the fitted vectors
    fn dim(&self) -> usize;

    /// Neighbors returned when no `k` is given
    fn n_neighbors(&self) -> usize;

    /// The `k` rows nearest to `query`, closest first.
    ///
    /// Returns fewer than `k` results when the index holds fewer rows.
    fn kneighbors(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// `kneighbors` with the index's default `k`
    fn kneighbors_default(&self, query: &[f32]) -> Result<Vec<Neighbor>> {
        self.kneighbors(query, self.n_neighbors())
    }
}
