use anyhow::Result;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{LevelCode, SearchType};

/// Earliest year with digitised results, used when the metadata endpoint is
/// unreachable.
pub const FALLBACK_FIRST_YEAR: i32 = 2019;

/// Static year range offered when the distinct-years lookup fails,
/// newest first.
pub fn fallback_years() -> Vec<i32> {
    let current = chrono::Utc::now().year();
    (FALLBACK_FIRST_YEAR..=current).rev().collect()
}

/// Reasons a form submission is rejected before any request is made.
/// Messages are shown to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a student name between 3 and 50 characters")]
    StudentNameLength,

    #[error("Center number must be exactly 5 digits")]
    CenterNumberFormat,

    #[error("Please enter a school or center name between 4 and 100 characters")]
    CenterNameLength,

    #[error("Please select both level and year")]
    MissingLevelOrYear,

    #[error("Results are only available for years {0}-{1}")]
    YearOutOfRange(i32, i32),
}

/// Client-side state of the search form: the active search type, its text
/// value, and the two selectors.
#[derive(Debug, Clone)]
pub struct SearchForm {
    pub search_type: SearchType,
    pub value: String,
    pub level: Option<LevelCode>,
    pub year: Option<i32>,
}

impl SearchForm {
    pub fn new(search_type: SearchType) -> SearchForm {
        SearchForm {
            search_type,
            value: String::new(),
            level: None,
            year: None,
        }
    }

    /// Check the form against the set of years the service can answer for.
    /// Mirrors the constraints enforced by the form markup so a submission
    /// never leaves with a value the handler would bounce.
    pub fn validate(&self, available_years: &[i32]) -> Result<(), FormError> {
        let value = self.value.trim();
        match self.search_type {
            SearchType::Name => {
                let len = value.chars().count();
                if !(3..=50).contains(&len) {
                    return Err(FormError::StudentNameLength);
                }
            }
            SearchType::Number => {
                if value.len() != 5 || !value.chars().all(|c| c.is_ascii_digit()) {
                    return Err(FormError::CenterNumberFormat);
                }
            }
            SearchType::School => {
                let len = value.chars().count();
                if !(4..=100).contains(&len) {
                    return Err(FormError::CenterNameLength);
                }
            }
        }

        let (Some(_), Some(year)) = (self.level, self.year) else {
            return Err(FormError::MissingLevelOrYear);
        };
        if !available_years.contains(&year) {
            let first = available_years
                .iter()
                .copied()
                .min()
                .unwrap_or(FALLBACK_FIRST_YEAR);
            let last = available_years.iter().copied().max().unwrap_or(first);
            return Err(FormError::YearOutOfRange(first, last));
        }

        Ok(())
    }

    /// The validated form as results-view URL parameters. None until both
    /// selectors are filled in.
    pub fn query(&self) -> Option<ResultsQuery> {
        Some(ResultsQuery {
            search_type: self.search_type,
            value: self.value.trim().to_string(),
            level: self.level?,
            year: self.year?,
        })
    }
}

/// URL query contract of the results view:
/// `?type=<name|number|school>&value=<string>&level=<OLG|OLT|ALG|ALT>&year=<int>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsQuery {
    #[serde(rename = "type")]
    pub search_type: SearchType,
    pub value: String,
    pub level: LevelCode,
    pub year: i32,
}

impl ResultsQuery {
    /// Shareable link to the results page on `base`
    pub fn results_url(&self, base: &str) -> Result<reqwest::Url> {
        let year = self.year.to_string();
        let url = reqwest::Url::parse_with_params(
            &format!("{}/results.html", base.trim_end_matches('/')),
            [
                ("type", self.search_type.as_str()),
                ("value", self.value.as_str()),
                ("level", self.level.as_str()),
                ("year", year.as_str()),
            ],
        )?;
        Ok(url)
    }
}
