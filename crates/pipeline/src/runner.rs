//! End-to-end pipeline run over the datasets on disk.

use crate::business_features::{BusinessFeatureEncoder, BusinessFeatureTable};
use crate::business_filter::{BusinessFilter, BusinessSelection};
use crate::config::PipelineConfig;
use crate::covid::CovidFeatureAugmenter;
use crate::rating_matrix::RatingMatrixBuilder;
use crate::user_features::{UserFeatureEncoder, UserFeatureTable};
use anyhow::{Context, Result, anyhow};
use data_loader::{BusinessId, DatasetPaths, RatingMatrix};
use neighbors::BruteForceCosine;
use tracing::{info, instrument};

/// Runs every stage in order, each over a fresh scan of its dataset.
///
/// ## Stages
/// 1. BusinessFilter over the business dataset
/// 2. RatingMatrixBuilder over the review dataset
/// 3. BusinessFeatureEncoder over the business dataset
/// 4. CovidFeatureAugmenter over the auxiliary dataset, if configured
/// 5. UserFeatureEncoder over the user dataset
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[instrument(skip_all, fields(category = %self.config.category))]
    pub fn run(&self, paths: &DatasetPaths) -> Result<PipelineOutput> {
        self.config.validate()?;
        let config = &self.config;

        let selection = BusinessFilter::new(&config.category)
            .with_min_reviews(config.min_reviews)
            .apply(paths.businesses()?)
            .context("Failed to filter businesses")?;

        let matrix = RatingMatrixBuilder::new(config.threshold)
            .with_policy(config.threshold_policy)
            .build(paths.reviews()?, &selection.ids(), config.start_date)
            .context("Failed to build rating matrix")?;

        let mut business_features = BusinessFeatureEncoder::new(config.taxonomy.clone())
            .encode(matrix.business_ids(), paths.businesses()?)
            .context("Failed to encode business features")?;

        if let Some(covid) = paths.covid_features() {
            business_features = CovidFeatureAugmenter
                .augment(business_features, covid?)
                .context("Failed to add pandemic features")?;
        }

        let user_features = UserFeatureEncoder::new(config.reference_date)
            .encode(matrix.user_ids(), paths.users()?)
            .context("Failed to encode user features")?;

        info!(
            "Pipeline done: {} businesses selected, matrix {:?}, {} business rows, {} user rows",
            selection.len(),
            matrix.shape(),
            business_features.len(),
            user_features.len()
        );

        Ok(PipelineOutput {
            selection,
            matrix,
            business_features,
            user_features,
            n_neighbors: config.n_neighbors,
        })
    }
}

/// A business found by a similarity lookup
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarBusiness {
    pub business_id: BusinessId,
    pub name: String,
    pub distance: f64,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub selection: BusinessSelection,
    pub matrix: RatingMatrix,
    pub business_features: BusinessFeatureTable,
    pub user_features: UserFeatureTable,
    n_neighbors: usize,
}

impl PipelineOutput {
    /// Fit the cosine index on the rating matrix with the configured `k`
    pub fn fit_neighbors(&self) -> BruteForceCosine {
        BruteForceCosine::fit(&self.matrix).with_n_neighbors(self.n_neighbors)
    }

    /// Businesses rated most like the one called `name`, itself excluded.
    pub fn similar_by_name(
        &self,
        index: &BruteForceCosine,
        name: &str,
        k: usize,
    ) -> Result<Vec<SimilarBusiness>> {
        let business_id = self
            .selection
            .id_for_name(name)
            .ok_or_else(|| anyhow!("No selected business is named {:?}", name))?;
        if !self.matrix.contains_business(business_id) {
            return Err(anyhow!(
                "{:?} has too few qualifying reviews to be in the rating matrix",
                name
            ));
        }

        // One extra to make room for the business itself
        let neighbors = index.kneighbors_of_label(business_id, k + 1)?;
        Ok(neighbors
            .into_iter()
            .filter(|n| &n.label != business_id)
            .take(k)
            .map(|n| SimilarBusiness {
                name: self
                    .selection
                    .get(&n.label)
                    .map(|b| b.name.clone())
                    .unwrap_or_default(),
                business_id: n.label,
                distance: n.distance,
            })
            .collect())
    }
}
