use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::formats::{Diagnostics, MovieRecord};
use crate::query::QueryOptions;

#[derive(Debug, Clone, Serialize)]
pub struct ChartSnapshot {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub diagnostics: Diagnostics,
    pub records: Vec<MovieRecord>,
    pub error: Option<String>,
}

impl ChartSnapshot {
    pub fn failed(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            loaded_at: Utc::now(),
            diagnostics: Diagnostics::default(),
            records: Vec::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoviesResponse<'a> {
    pub source: &'a str,
    pub loaded_at: DateTime<Utc>,
    pub filters: QueryOptions,
    pub diagnostics: &'a Diagnostics,
    pub error: Option<&'a str>,
    pub count: usize,
    pub movies: Vec<MovieRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedQuery {
    pub error: String,
    pub allowed: AllowedValues,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllowedValues {
    pub limit: &'static str,
    pub sort: Vec<&'static str>,
    pub direction: [&'static str; 2],
}

impl AllowedValues {
    pub fn new() -> Self {
        Self {
            limit: "1-250",
            sort: crate::query::SortField::ALL
                .iter()
                .map(|f| f.as_str())
                .collect(),
            direction: ["asc", "desc"],
        }
    }
}

impl Default for AllowedValues {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse<'a> {
    pub source: &'a str,
    pub loaded_at: DateTime<Utc>,
    pub diagnostics: &'a Diagnostics,
}
