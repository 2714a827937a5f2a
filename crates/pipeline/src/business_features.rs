//! Feature encoding for the businesses in the rating matrix.
//!
//! Each business gets:
//! - `review_count`: natural log of the dataset review count
//! - one `S_<state>` indicator per observed state bucket (exactly one is set)
//! - one indicator per taxonomy label plus `Other_Category` (multi-label)
//! - `hasHighlights` / `delivery_or_takeout` once pandemic features are added

use crate::config::Taxonomy;
use anyhow::Result;
use data_loader::{BusinessId, BusinessRecord};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

pub const REVIEW_COUNT_COLUMN: &str = "review_count";
pub const STATE_PREFIX: &str = "S_";
pub const OTHER_CATEGORY_COLUMN: &str = "Other_Category";
pub const HIGHLIGHTS_COLUMN: &str = "hasHighlights";
pub const DELIVERY_COLUMN: &str = "delivery_or_takeout";

/// The two pandemic-era service flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CovidFlags {
    pub has_highlights: bool,
    pub delivery_or_takeout: bool,
}

/// One row of the business feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessFeatures {
    pub business_id: BusinessId,
    /// ln(review_count)
    pub review_count: f64,
    /// Top state code or `Other_State`
    pub state: String,
    /// Indicator per taxonomy label, in taxonomy order
    pub categories: Vec<bool>,
    /// Set iff no taxonomy label matched
    pub other_category: bool,
    /// `None` until an auxiliary record for this business is seen
    pub covid: Option<CovidFlags>,
}

impl BusinessFeatures {
    /// Derive features from a raw record.
    ///
    /// Category labels are compared case-insensitively against the
    /// comma-separated category list. A missing or empty list matches no
    /// label.
    pub fn from_record(record: &BusinessRecord, taxonomy: &Taxonomy) -> Self {
        let mut categories = vec![false; taxonomy.labels.len()];
        if let Some(list) = record.categories.as_deref() {
            for label in list.to_lowercase().split(',').map(str::trim) {
                if let Some(pos) = taxonomy.label_position(label) {
                    categories[pos] = true;
                }
            }
        }
        let other_category = !categories.iter().any(|&c| c);

        Self {
            business_id: record.business_id.clone(),
            review_count: f64::from(record.review_count).ln(),
            state: taxonomy.state_bucket(&record.state).to_string(),
            categories,
            other_category,
            covid: None,
        }
    }
}

/// Business features for exactly the rows of a rating matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessFeatureTable {
    labels: Vec<String>,
    /// Distinct state buckets observed, sorted
    states: Vec<String>,
    rows: Vec<BusinessFeatures>,
    index: HashMap<BusinessId, usize>,
    covid_applied: bool,
}

impl BusinessFeatureTable {
    fn new(labels: Vec<String>, rows: Vec<BusinessFeatures>) -> Self {
        let mut states: Vec<String> = rows.iter().map(|r| r.state.clone()).collect();
        states.sort_unstable();
        states.dedup();

        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.business_id.clone(), i))
            .collect();

        Self {
            labels,
            states,
            rows,
            index,
            covid_applied: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[BusinessFeatures] {
        &self.rows
    }

    pub fn ids(&self) -> impl Iterator<Item = &BusinessId> {
        self.rows.iter().map(|r| &r.business_id)
    }

    pub fn get(&self, business_id: &str) -> Option<&BusinessFeatures> {
        self.index.get(business_id).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, business_id: &str) -> bool {
        self.index.contains_key(business_id)
    }

    /// Category labels with their own column, in column order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// State buckets with their own column, in column order
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Whether the pandemic flag columns are part of the schema
    pub fn has_covid_columns(&self) -> bool {
        self.covid_applied
    }

    /// Record pandemic flags for one business.
    ///
    /// Returns `false` (and changes nothing) when the business is not in the
    /// table.
    pub fn set_covid_flags(&mut self, business_id: &str, flags: CovidFlags) -> bool {
        match self.index.get(business_id) {
            Some(&i) => {
                self.rows[i].covid = Some(flags);
                true
            }
            None => false,
        }
    }

    /// Add the pandemic flag columns to the schema. Rows without flags read
    /// as absent.
    pub(crate) fn enable_covid_columns(&mut self) {
        self.covid_applied = true;
    }

    /// Column names in the order `values` returns them
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![REVIEW_COUNT_COLUMN.to_string()];
        names.extend(self.states.iter().map(|s| format!("{}{}", STATE_PREFIX, s)));
        names.extend(self.labels.iter().cloned());
        names.push(OTHER_CATEGORY_COLUMN.to_string());
        if self.covid_applied {
            names.push(HIGHLIGHTS_COLUMN.to_string());
            names.push(DELIVERY_COLUMN.to_string());
        }
        names
    }

    /// One row as column values; `None` marks an absent pandemic flag
    pub fn values(&self, row: &BusinessFeatures) -> Vec<Option<f64>> {
        let indicator = |b: bool| Some(if b { 1.0 } else { 0.0 });

        let mut values = vec![Some(row.review_count)];
        values.extend(self.states.iter().map(|s| indicator(*s == row.state)));
        values.extend(row.categories.iter().map(|&c| indicator(c)));
        values.push(indicator(row.other_category));
        if self.covid_applied {
            values.push(row.covid.and_then(|f| indicator(f.has_highlights)));
            values.push(row.covid.and_then(|f| indicator(f.delivery_or_takeout)));
        }
        values
    }

    /// Dense export with absent values as NaN
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                self.values(row)
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect()
            })
            .collect()
    }
}

/// Encodes business records for the businesses of a rating matrix.
#[derive(Debug, Clone, Default)]
pub struct BusinessFeatureEncoder {
    taxonomy: Taxonomy,
}

impl BusinessFeatureEncoder {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Scan business records and encode those whose identifier is in
    /// `business_ids`.
    ///
    /// Rows follow dataset scan order; a repeated identifier replaces its
    /// earlier row. Identifiers with no record are logged and left out.
    #[instrument(skip_all, fields(businesses = business_ids.len()))]
    pub fn encode<I>(&self, business_ids: &[BusinessId], records: I) -> Result<BusinessFeatureTable>
    where
        I: IntoIterator<Item = data_loader::Result<BusinessRecord>>,
    {
        let wanted: HashSet<&str> = business_ids.iter().map(String::as_str).collect();

        let mut matched: Vec<BusinessRecord> = Vec::new();
        let mut positions: HashMap<BusinessId, usize> = HashMap::new();
        for record in records {
            let record = record?;
            if !wanted.contains(record.business_id.as_str()) {
                continue;
            }
            match positions.get(&record.business_id) {
                Some(&i) => matched[i] = record,
                None => {
                    positions.insert(record.business_id.clone(), matched.len());
                    matched.push(record);
                }
            }
        }

        let missing = wanted.len() - positions.len();
        if missing > 0 {
            warn!("{} matrix businesses have no business record", missing);
        }

        let rows: Vec<BusinessFeatures> = matched
            .par_iter()
            .map(|record| BusinessFeatures::from_record(record, &self.taxonomy))
            .collect();

        let table = BusinessFeatureTable::new(self.taxonomy.labels.clone(), rows);
        info!(
            "Encoded {} businesses into {} columns",
            table.len(),
            table.column_names().len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OTHER_STATE;
    use crate::test_support::business_line;
    use data_loader::JsonLines;
    use std::io::Cursor;

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(["bars", "nightlife", "pubs"], ["AZ", "NV"])
    }

    fn encode(ids: &[&str], lines: &[String]) -> BusinessFeatureTable {
        let ids: Vec<BusinessId> = ids.iter().map(|s| s.to_string()).collect();
        BusinessFeatureEncoder::new(taxonomy())
            .encode(&ids, JsonLines::new(Cursor::new(lines.join("\n")), "business"))
            .unwrap()
    }

    fn sample_lines() -> Vec<String> {
        vec![
            business_line("b1", "Dive", "AZ", Some("Bars, Nightlife"), 20),
            business_line("b2", "Maple Pub", "ON", Some("Pubs, Restaurants"), 50),
            business_line("b3", "Smokehouse", "NV", Some("Barbeque"), 11),
            business_line("b4", "Unlisted", "AZ", Some("Bars"), 30),
            business_line("b5", "Ghost", "AZ", None, 12),
        ]
    }

    #[test]
    fn test_row_set_matches_requested_ids() {
        let table = encode(&["b1", "b2", "b3", "b5"], &sample_lines());

        let ids: HashSet<&str> = table.ids().map(String::as_str).collect();
        assert_eq!(ids, HashSet::from(["b1", "b2", "b3", "b5"]));
        assert!(!table.contains("b4"));
    }

    #[test]
    fn test_missing_join_target_is_omitted() {
        let table = encode(&["b1", "nowhere"], &sample_lines());
        assert_eq!(table.len(), 1);
        assert!(table.get("nowhere").is_none());
    }

    #[test]
    fn test_category_indicators() {
        let table = encode(&["b1", "b2", "b3", "b5"], &sample_lines());

        let dive = table.get("b1").unwrap();
        assert_eq!(dive.categories, vec![true, true, false]);
        assert!(!dive.other_category);

        let pub_row = table.get("b2").unwrap();
        assert_eq!(pub_row.categories, vec![false, false, true]);

        // "Barbeque" is not the label "bars"
        let smokehouse = table.get("b3").unwrap();
        assert_eq!(smokehouse.categories, vec![false, false, false]);
        assert!(smokehouse.other_category);

        let ghost = table.get("b5").unwrap();
        assert!(ghost.other_category);
    }

    #[test]
    fn test_state_buckets_partition() {
        let table = encode(&["b1", "b2", "b3"], &sample_lines());

        assert_eq!(table.states(), &["AZ", "NV", OTHER_STATE]);
        assert_eq!(table.get("b2").unwrap().state, OTHER_STATE);

        let n_states = table.states().len();
        for row in table.to_rows() {
            let set: f64 = row[1..1 + n_states].iter().sum();
            assert_eq!(set, 1.0);
        }
    }

    #[test]
    fn test_one_hot_invariant() {
        let table = encode(&["b1", "b2", "b3", "b5"], &sample_lines());
        let first_label = 1 + table.states().len();
        let n_labels = table.labels().len();

        for row in table.to_rows() {
            let labels: f64 = row[first_label..first_label + n_labels].iter().sum();
            let other = row[first_label + n_labels];
            assert!(labels + other >= 1.0);
            assert_eq!(other == 1.0, labels == 0.0);
        }
    }

    #[test]
    fn test_review_count_is_log_transformed() {
        let table = encode(&["b2"], &sample_lines());
        assert!((table.get("b2").unwrap().review_count - 50f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_columns_and_scan_order() {
        let table = encode(&["b3", "b1"], &sample_lines());

        assert_eq!(
            table.column_names(),
            vec![
                "review_count",
                "S_AZ",
                "S_NV",
                "bars",
                "nightlife",
                "pubs",
                "Other_Category"
            ]
        );
        let order: Vec<&str> = table.ids().map(String::as_str).collect();
        assert_eq!(order, vec!["b1", "b3"]);
    }

    #[test]
    fn test_duplicate_record_replaces_row() {
        let mut lines = sample_lines();
        lines.push(business_line("b1", "Dive", "NV", Some("Pubs"), 25));

        let table = encode(&["b1", "b3"], &lines);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].business_id, "b1");
        assert_eq!(table.get("b1").unwrap().state, "NV");
        assert_eq!(table.get("b1").unwrap().categories, vec![false, false, true]);
    }

    #[test]
    fn test_empty_ids_give_empty_table() {
        let table = encode(&[], &sample_lines());
        assert!(table.is_empty());
        assert!(table.to_rows().is_empty());
    }

    #[test]
    fn test_config_taxonomy_matches_case_insensitively() {
        let config: crate::config::PipelineConfig = serde_json::from_str(
            r#"{"taxonomy": {"labels": ["Bars", "Nightlife"], "states": ["AZ"]}}"#,
        )
        .unwrap();
        let lines = vec![business_line("b1", "Dive", "AZ", Some("Bars, Nightlife"), 20)];

        let table = BusinessFeatureEncoder::new(config.taxonomy)
            .encode(
                &["b1".to_string()],
                JsonLines::new(Cursor::new(lines.join("\n")), "business"),
            )
            .unwrap();

        let dive = table.get("b1").unwrap();
        assert_eq!(dive.categories, vec![true, true]);
        assert!(!dive.other_category);
    }
}
