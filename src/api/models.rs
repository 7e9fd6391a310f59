use serde::{Deserialize, Serialize};

use crate::models::SearchResult;

/// Body of `POST /api/search`. Everything arrives as strings; fields are
/// optional here so that absence is answered by the handler's own
/// validation message instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub search_value: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_results: usize,
}

/// Selector data for the search form, from the two metadata functions
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaResponse {
    pub years: Vec<i32>,
    pub levels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
