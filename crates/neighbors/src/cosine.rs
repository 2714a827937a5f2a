//! Exhaustive cosine-distance nearest-neighbor search.
//!
//! ## Algorithm
//! 1. At fit time, L2-normalize every row (all-zero rows stay zero)
//! 2. For a query, normalize it the same way and take the dot product with
//!    every row in parallel
//! 3. distance = 1 - dot, clamped to [0, 2]
//! 4. Sort by distance, ties by row position, keep the first `k`
//!
//! A zero vector has no direction, so its distance to anything is 1.

use crate::{Neighbor, NeighborIndex};
use anyhow::{Result, anyhow, bail};
use data_loader::RatingMatrix;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Default number of neighbors per query
pub const DEFAULT_N_NEIGHBORS: usize = 20;

/// Brute-force cosine index over the rows of a rating matrix.
#[derive(Debug, Clone)]
pub struct BruteForceCosine {
    labels: Vec<String>,
    label_pos: HashMap<String, usize>,
    /// Row-major normalized vectors
    rows: Vec<f64>,
    dim: usize,
    n_neighbors: usize,
}

impl BruteForceCosine {
    /// Fit the index on the business rows of `matrix`.
    #[instrument(skip_all)]
    pub fn fit(matrix: &RatingMatrix) -> Self {
        let (n_rows, dim) = matrix.shape();
        let rows: Vec<f64> = (0..n_rows)
            .into_par_iter()
            .flat_map_iter(|i| normalize(matrix.row(i)))
            .collect();

        let labels = matrix.business_ids().to_vec();
        let label_pos = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();

        debug!("Fitted cosine index on {} rows of dimension {}", n_rows, dim);
        Self {
            labels,
            label_pos,
            rows,
            dim,
            n_neighbors: DEFAULT_N_NEIGHBORS,
        }
    }

    /// Configure the default number of neighbors (default: 20)
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Neighbors of a fitted row, found by its label.
    ///
    /// The row itself is part of the result at distance 0 (unless it is
    /// all zeros).
    pub fn kneighbors_of_label(&self, label: &str, k: usize) -> Result<Vec<Neighbor>> {
        let pos = *self
            .label_pos
            .get(label)
            .ok_or_else(|| anyhow!("{} is not a row of the index", label))?;
        Ok(self.search(self.row(pos), k))
    }

    fn row(&self, pos: usize) -> &[f64] {
        &self.rows[pos * self.dim..(pos + 1) * self.dim]
    }

    fn search(&self, query: &[f64], k: usize) -> Vec<Neighbor> {
        if self.labels.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = (0..self.labels.len())
            .into_par_iter()
            .map(|i| {
                let dot: f64 = self.row(i).iter().zip(query).map(|(a, b)| a * b).sum();
                (i, (1.0 - dot).clamp(0.0, 2.0))
            })
            .collect();

        scored.par_sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(index, distance)| Neighbor {
                index,
                label: self.labels[index].clone(),
                distance,
            })
            .collect()
    }
}

impl NeighborIndex for BruteForceCosine {
    fn len(&self) -> usize {
        self.labels.len()
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn kneighbors(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim && !self.labels.is_empty() {
            bail!(
                "query has dimension {} but the index was fit on dimension {}",
                query.len(),
                self.dim
            );
        }
        Ok(self.search(&normalize(query), k))
    }
}

/// L2-normalize into f64; an all-zero vector stays all zeros
fn normalize(v: &[f32]) -> Vec<f64> {
    let norm = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt();
    if norm == 0.0 {
        vec![0.0; v.len()]
    } else {
        v.iter().map(|&x| f64::from(x) / norm).collect()
    }
}
