// src/models/mod.rs

use chrono::{DateTime, SubsecRound, Utc};

pub mod answer;
pub mod assessment;
pub mod attempt;
pub mod stats;
pub mod submission;

/// Current instant at the store's timestamp precision (microseconds), so that
/// values survive a round trip through Postgres unchanged.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn to_store_precision(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(6)
}
