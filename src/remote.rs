use anyhow::Result;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::CONFIG;
use crate::models::{SearchResult, SearchType};

/// Remote function names as constants for consistency
pub mod functions {
    pub const SEARCH_BY_STUDENT_NAME: &str = "search_by_student_name";
    pub const SEARCH_BY_CENTER_NUMBER: &str = "search_by_center_number";
    pub const SEARCH_BY_CENTER_NAME: &str = "search_by_center_name";
    pub const GET_DISTINCT_YEARS: &str = "get_distinct_years";
    pub const GET_DISTINCT_LEVELS: &str = "get_distinct_levels";
}

/// Failure modes of a remote call. The detail here is for the server log;
/// callers map everything to their own generic message before answering.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {function} failed: {source}")]
    Transport {
        function: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{function} returned {status}: {detail}")]
    Rpc {
        function: &'static str,
        status: StatusCode,
        detail: String,
    },

    #[error("could not decode {function} response: {source}")]
    Decode {
        function: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// Parameter shapes accepted by the lookup functions. Center-number lookups
/// carry the value under a dedicated key; the other two share the generic
/// search-term key.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RpcParams<'a> {
    Center {
        center_num: &'a str,
        level_filter: &'a str,
        year_filter: i32,
    },
    Term {
        search_term: &'a str,
        level_filter: &'a str,
        year_filter: i32,
    },
}

impl<'a> RpcParams<'a> {
    pub fn new(
        search_type: SearchType,
        value: &'a str,
        level: &'a str,
        year: i32,
    ) -> RpcParams<'a> {
        match search_type {
            SearchType::Number => RpcParams::Center {
                center_num: value,
                level_filter: level,
                year_filter: year,
            },
            SearchType::Name | SearchType::School => RpcParams::Term {
                search_term: value,
                level_filter: level,
                year_filter: year,
            },
        }
    }
}

/// Client for the hosted results database. All data access goes through its
/// callable functions; nothing is queried or written directly.
#[derive(Debug, Clone)]
pub struct RemoteDataService {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RemoteDataService {
    /// Create a client against a specific endpoint. Useful for tests.
    pub fn new(base_url: &str, anon_key: &str) -> Result<RemoteDataService> {
        let http = reqwest::Client::builder().build()?;
        log::info!("Remote data service endpoint: {}", base_url);

        Ok(RemoteDataService {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    /// Create a client using environment configuration
    pub fn from_config() -> Result<RemoteDataService> {
        Self::new(&CONFIG.supabase_url, &CONFIG.supabase_anon_key)
    }

    fn function_for(search_type: SearchType) -> &'static str {
        match search_type {
            SearchType::Name => functions::SEARCH_BY_STUDENT_NAME,
            SearchType::Number => functions::SEARCH_BY_CENTER_NUMBER,
            SearchType::School => functions::SEARCH_BY_CENTER_NAME,
        }
    }

    /// One POST to `/rest/v1/rpc/{function}`, decoded as JSON. No retry, no
    /// extra timeout beyond the client default.
    async fn rpc<P, T>(&self, function: &'static str, params: &P) -> Result<T, RemoteError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(params)
            .send()
            .await
            .map_err(|source| RemoteError::Transport { function, source })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RemoteError::Rpc {
                function,
                status,
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| RemoteError::Decode { function, source })
    }

    /// Run the lookup function matching `search_type` and return the full
    /// match set. Pagination over it is the caller's concern.
    pub async fn search(
        &self,
        search_type: SearchType,
        value: &str,
        level: &str,
        year: i32,
    ) -> Result<Vec<SearchResult>, RemoteError> {
        let function = Self::function_for(search_type);
        let params = RpcParams::new(search_type, value, level, year);
        self.rpc(function, &params).await
    }

    /// Distinct examination years present in the dataset
    pub async fn distinct_years(&self) -> Result<Vec<i32>, RemoteError> {
        self.rpc(functions::GET_DISTINCT_YEARS, &serde_json::json!({}))
            .await
    }

    /// Distinct level codes present in the dataset
    pub async fn distinct_levels(&self) -> Result<Vec<String>, RemoteError> {
        self.rpc(functions::GET_DISTINCT_LEVELS, &serde_json::json!({}))
            .await
    }
}
