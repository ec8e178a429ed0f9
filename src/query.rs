use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coerce::duration_minutes;
use crate::formats::MovieRecord;

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 250;
pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    #[default]
    Ranking,
    UserRating,
    ReleaseDate,
    RatingCount,
    Title,
    Popularity,
    Runtime,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Ranking,
        SortField::UserRating,
        SortField::ReleaseDate,
        SortField::RatingCount,
        SortField::Title,
        SortField::Popularity,
        SortField::Runtime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Ranking => "RANKING",
            SortField::UserRating => "USER_RATING",
            SortField::ReleaseDate => "RELEASE_DATE",
            SortField::RatingCount => "RATING_COUNT",
            SortField::Title => "TITLE",
            SortField::Popularity => "POPULARITY",
            SortField::Runtime => "RUNTIME",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Ranking => "Ranking (default)",
            SortField::UserRating => "IMDb rating",
            SortField::ReleaseDate => "Release date",
            SortField::RatingCount => "Rating count",
            SortField::Title => "Title",
            SortField::Popularity => "Popularity",
            SortField::Runtime => "Runtime",
        }
    }

    fn key(self, record: &MovieRecord) -> Option<SortKey<'_>> {
        match self {
            SortField::Ranking => Some(SortKey::Int(u64::from(record.rank))),
            SortField::UserRating => record.rating_value.map(SortKey::Float),
            SortField::RatingCount => record.rating_count.map(SortKey::Int),
            SortField::Title => Some(SortKey::Text(&record.name)),
            SortField::Runtime => record
                .duration
                .as_deref()
                .and_then(duration_minutes)
                .map(SortKey::Int),
            // Neither value is carried by the chart's structured data.
            SortField::ReleaseDate | SortField::Popularity => None,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = InvalidQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RANKING" => Ok(SortField::Ranking),
            "USER_RATING" => Ok(SortField::UserRating),
            "RELEASE_DATE" => Ok(SortField::ReleaseDate),
            "RATING_COUNT" | "USER_RATING_COUNT" => Ok(SortField::RatingCount),
            "TITLE" | "TITLE_REGIONAL" => Ok(SortField::Title),
            "POPULARITY" => Ok(SortField::Popularity),
            "RUNTIME" => Ok(SortField::Runtime),
            _ => Err(InvalidQueryError::UnknownSortField(raw.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = InvalidQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(InvalidQueryError::UnknownDirection(raw.to_owned())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidQueryError {
    #[error("limit must be an integer between 1 and 250, got {0:?}")]
    MalformedLimit(String),

    #[error("limit must be between 1 and 250, got {0}")]
    LimitOutOfRange(i64),

    #[error("unknown sort field {0:?}; expected one of: {allowed}", allowed = allowed_sort_fields())]
    UnknownSortField(String),

    #[error("unknown direction {0:?}; expected one of: asc, desc")]
    UnknownDirection(String),
}

fn allowed_sort_fields() -> String {
    SortField::ALL
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    pub limit: usize,
    #[serde(rename = "sort")]
    pub sort_field: SortField,
    pub direction: Direction,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            sort_field: SortField::default(),
            direction: Direction::default(),
        }
    }
}

impl QueryOptions {
    pub fn from_params(params: &QueryParams) -> Result<Self, InvalidQueryError> {
        let mut options = Self::default();

        if let Some(raw) = non_blank(params.limit.as_deref()) {
            let limit: i64 = raw
                .parse()
                .map_err(|_| InvalidQueryError::MalformedLimit(raw.to_owned()))?;
            options.limit = checked_limit(limit)?;
        }
        if let Some(raw) = non_blank(params.sort.as_deref()) {
            options.sort_field = raw.parse()?;
        }
        if let Some(raw) = non_blank(params.direction.as_deref()) {
            options.direction = raw.parse()?;
        }

        Ok(options)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn checked_limit(limit: i64) -> Result<usize, InvalidQueryError> {
    if limit < MIN_LIMIT as i64 || limit > MAX_LIMIT as i64 {
        return Err(InvalidQueryError::LimitOutOfRange(limit));
    }
    Ok(limit as usize)
}

#[derive(Debug)]
enum SortKey<'a> {
    Int(u64),
    Float(f64),
    Text(&'a str),
}

fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
        (SortKey::Float(a), SortKey::Float(b)) => a.total_cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        _ => Ordering::Equal,
    }
}

/// Returns a sorted, truncated copy of `records`.
///
/// Records without a value for the sort field always come last, in either
/// direction. Equal keys keep their input order.
pub fn query(
    records: &[MovieRecord],
    options: &QueryOptions,
) -> Result<Vec<MovieRecord>, InvalidQueryError> {
    let limit = checked_limit(i64::try_from(options.limit).unwrap_or(i64::MAX))?;

    let mut keyed: Vec<(Option<SortKey<'_>>, &MovieRecord)> = records
        .iter()
        .map(|record| (options.sort_field.key(record), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => {
            let ord = compare_keys(a, b);
            match options.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    Ok(keyed
        .into_iter()
        .take(limit)
        .map(|(_, record)| record.clone())
        .collect())
}
