//! Planner error types.
//!
//! Routing/network failures are deliberately absent here: the oracle
//! degrades them to zero-cost legs so optimization can proceed with
//! partial data.

use chrono::NaiveDateTime;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    /// No catalog record matched the requested name, exactly or by
    /// substring.
    #[error("no site found matching '{name}'")]
    SiteNotFound { name: String },

    /// Several records matched and the injected resolver declined to pick
    /// one.
    #[error("'{name}' matched {count} sites and none was selected")]
    AmbiguousSite { name: String, count: usize },

    #[error("could not geocode address '{address}'")]
    GeocodeFailed { address: String },

    /// An overtime policy answered `Defer` with a timestamp that does not
    /// advance past the current day's start. Caller contract violation.
    #[error("deferred day start {proposed} does not advance past {day_start}")]
    StaleDayStart {
        proposed: NaiveDateTime,
        day_start: NaiveDateTime,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
