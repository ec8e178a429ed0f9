use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    pub rank: u32,
    pub url: String,
    pub name: String,
    pub alternate_name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub rating_value: Option<f64>,
    pub rating_count: Option<u64>,
    pub content_rating: Option<String>,
    pub genre: Vec<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate(Map<String, Value>);

impl RawCandidate {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawCandidate {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub html_length: usize,
    pub ldjson_blocks: usize,
    pub ldjson_decoded: usize,
    pub rank_hints: usize,
    pub candidates: usize,
    pub dropped_unranked: usize,
    pub dropped_invalid: usize,
    pub duplicates: usize,
    pub records: usize,
}
