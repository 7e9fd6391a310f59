use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

use crate::models::SearchType;
use crate::remote::{RemoteDataService, RemoteError};

use super::models::{ErrorBody, MetaResponse, SearchRequest, SearchResponse};

/// What a handler can answer with when it does not answer with data.
/// Validation messages go to the client verbatim; upstream detail stays in
/// the server log and the client sees only the generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Database query failed")]
    Upstream(#[from] RemoteError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, *message),
            ApiError::Upstream(cause) => {
                tracing::error!(error = %cause, "remote lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database query failed")
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

pub async fn search_handler(
    State(remote): State<Arc<RemoteDataService>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let (Some(search_type), Some(search_value), Some(level), Some(year)) = (
        required(&request.search_type),
        required(&request.search_value),
        required(&request.level),
        required(&request.year),
    ) else {
        return Err(ApiError::Validation("Missing required fields"));
    };

    let search_type =
        SearchType::parse(search_type).ok_or(ApiError::Validation("Invalid search type"))?;
    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::Validation("Invalid year"))?;

    // One call, full match set back; paging over it is a client concern.
    let results = remote.search(search_type, search_value, level, year).await?;
    let total_results = results.len();

    Ok(Json(SearchResponse {
        results,
        total_results,
    }))
}

pub async fn meta_handler(
    State(remote): State<Arc<RemoteDataService>>,
) -> Result<Json<MetaResponse>, ApiError> {
    let years = remote.distinct_years().await?;
    let levels = remote.distinct_levels().await?;

    Ok(Json(MetaResponse { years, levels }))
}
