//! Feature encoding for the users in the rating matrix.
//!
//! Activity counts are heavy-tailed, so every feature except `elite` is log
//! scaled. `review_count`, `yelping_since` and `friends` use a plain natural
//! log and are undefined at zero (`-inf`); the rest use `ln(1 + x)`.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use data_loader::{UserId, UserRecord, parse_timestamp};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument, warn};

pub const USER_COLUMNS: [&str; 7] = [
    "review_count",
    "yelping_since",
    "friends",
    "feedback",
    "fans",
    "elite",
    "total_compliments",
];

const SECONDS_PER_DAY: i64 = 86_400;

/// Raw activity counts derived from a user record, before scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct UserActivity {
    pub review_count: u32,
    pub yelping_since: NaiveDateTime,
    /// Whitespace-separated tokens in the friends field
    pub friends: usize,
    /// useful + funny + cool
    pub feedback: u64,
    pub fans: u64,
    /// Comma-separated elite years, 0 when the field is empty
    pub elite: usize,
    /// Sum of the eleven compliment counters
    pub total_compliments: u64,
}

impl UserActivity {
    pub fn from_record(record: &UserRecord) -> data_loader::Result<Self> {
        let elite = if record.elite.is_empty() {
            0
        } else {
            record.elite.split(',').count()
        };

        let total_compliments = record.compliment_hot
            + record.compliment_more
            + record.compliment_profile
            + record.compliment_cute
            + record.compliment_list
            + record.compliment_note
            + record.compliment_plain
            + record.compliment_cool
            + record.compliment_funny
            + record.compliment_writer
            + record.compliment_photos;

        Ok(Self {
            review_count: record.review_count,
            yelping_since: parse_timestamp("yelping_since", &record.yelping_since)?,
            friends: record.friends.split_whitespace().count(),
            feedback: record.useful + record.funny + record.cool,
            fans: record.fans,
            elite,
            total_compliments,
        })
    }

    /// Whole days from account creation to midnight of `reference`, floored
    pub fn account_age_days(&self, reference: NaiveDate) -> i64 {
        let delta = reference.and_time(NaiveTime::MIN) - self.yelping_since;
        delta.num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}

/// One row of the user feature table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFeatures {
    pub user_id: UserId,
    pub review_count: f64,
    pub yelping_since: f64,
    pub friends: f64,
    pub feedback: f64,
    pub fans: f64,
    pub elite: f64,
    pub total_compliments: f64,
}

impl UserFeatures {
    pub fn from_activity(user_id: UserId, activity: &UserActivity, reference: NaiveDate) -> Self {
        Self {
            user_id,
            review_count: f64::from(activity.review_count).ln(),
            yelping_since: (activity.account_age_days(reference) as f64).ln(),
            friends: (activity.friends as f64).ln(),
            feedback: (activity.feedback as f64).ln_1p(),
            fans: (activity.fans as f64).ln_1p(),
            elite: activity.elite as f64,
            total_compliments: (activity.total_compliments as f64).ln_1p(),
        }
    }

    /// Values in `USER_COLUMNS` order
    pub fn values(&self) -> [f64; 7] {
        [
            self.review_count,
            self.yelping_since,
            self.friends,
            self.feedback,
            self.fans,
            self.elite,
            self.total_compliments,
        ]
    }

    /// Columns holding -inf or NaN
    pub fn undefined_columns(&self) -> Vec<&'static str> {
        USER_COLUMNS
            .iter()
            .zip(self.values())
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// User features for exactly the columns of a rating matrix.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserFeatureTable {
    rows: Vec<UserFeatures>,
    index: HashMap<UserId, usize>,
}

impl UserFeatureTable {
    fn new(rows: Vec<UserFeatures>) -> Self {
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.user_id.clone(), i))
            .collect();
        Self { rows, index }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[UserFeatures] {
        &self.rows
    }

    pub fn ids(&self) -> impl Iterator<Item = &UserId> {
        self.rows.iter().map(|r| &r.user_id)
    }

    pub fn get(&self, user_id: &str) -> Option<&UserFeatures> {
        self.index.get(user_id).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.index.contains_key(user_id)
    }

    pub fn column_names(&self) -> Vec<String> {
        USER_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.values().to_vec()).collect()
    }

    /// Users with at least one undefined feature (e.g. zero friends)
    pub fn undefined_rows(&self) -> Vec<&UserFeatures> {
        self.rows
            .iter()
            .filter(|r| r.values().iter().any(|v| !v.is_finite()))
            .collect()
    }
}

/// Encodes user records for the users of a rating matrix.
#[derive(Debug, Clone)]
pub struct UserFeatureEncoder {
    reference_date: NaiveDate,
}

impl UserFeatureEncoder {
    /// `reference_date` is the day account age is measured up to
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Scan user records and encode those whose identifier is in `user_ids`.
    ///
    /// Rows follow dataset scan order; a repeated identifier replaces its
    /// earlier row. Identifiers with no record are logged and left out.
    /// Undefined log transforms are kept as-is and only logged.
    #[instrument(skip_all, fields(users = user_ids.len()))]
    pub fn encode<I>(&self, user_ids: &[UserId], records: I) -> Result<UserFeatureTable>
    where
        I: IntoIterator<Item = data_loader::Result<UserRecord>>,
    {
        let wanted: HashSet<&str> = user_ids.iter().map(String::as_str).collect();

        let mut matched: Vec<UserRecord> = Vec::new();
        let mut positions: HashMap<UserId, usize> = HashMap::new();
        for record in records {
            let record = record?;
            if !wanted.contains(record.user_id.as_str()) {
                continue;
            }
            match positions.get(&record.user_id) {
                Some(&i) => matched[i] = record,
                None => {
                    positions.insert(record.user_id.clone(), matched.len());
                    matched.push(record);
                }
            }
        }

        let missing = wanted.len() - positions.len();
        if missing > 0 {
            warn!("{} matrix users have no user record", missing);
        }

        let rows: Vec<UserFeatures> = matched
            .par_iter()
            .map(|record| -> data_loader::Result<UserFeatures> {
                let activity = UserActivity::from_record(record)?;
                Ok(UserFeatures::from_activity(
                    record.user_id.clone(),
                    &activity,
                    self.reference_date,
                ))
            })
            .collect::<data_loader::Result<Vec<_>>>()?;

        let table = UserFeatureTable::new(rows);
        let undefined = table.undefined_rows().len();
        if undefined > 0 {
            warn!("{} users have undefined log-scaled features", undefined);
        }
        info!("Encoded {} users", table.len());
        Ok(table)
    }
}
