//! Pandemic-era service flags for the business feature table.

use crate::business_features::{BusinessFeatureTable, CovidFlags};
use anyhow::Result;
use data_loader::CovidRecord;
use tracing::{info, instrument};

/// Adds `hasHighlights` and `delivery_or_takeout` to a business feature table.
///
/// A flag is set unless the auxiliary field holds the literal `"FALSE"`.
/// Businesses without an auxiliary record keep absent flags; no default is
/// filled in. Auxiliary records for businesses outside the table are ignored,
/// and a later record for the same business replaces an earlier one.
#[derive(Debug, Clone, Copy, Default)]
pub struct CovidFeatureAugmenter;

impl CovidFeatureAugmenter {
    #[instrument(skip_all, fields(businesses = table.len()))]
    pub fn augment<I>(&self, mut table: BusinessFeatureTable, records: I) -> Result<BusinessFeatureTable>
    where
        I: IntoIterator<Item = data_loader::Result<CovidRecord>>,
    {
        table.enable_covid_columns();

        let mut updated = 0usize;
        for record in records {
            let record = record?;
            let flags = CovidFlags {
                has_highlights: record.has_highlights(),
                delivery_or_takeout: record.offers_delivery_or_takeout(),
            };
            if table.set_covid_flags(&record.business_id, flags) {
                updated += 1;
            }
        }

        let absent = table.rows().iter().filter(|r| r.covid.is_none()).count();
        info!(
            "Applied {} pandemic feature records, {} businesses without flags",
            updated, absent
        );
        Ok(table)
    }
}
