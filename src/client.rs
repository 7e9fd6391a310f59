use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::api::models::{ErrorBody, MetaResponse, SearchResponse};
use crate::form::{ResultsQuery, SearchForm, fallback_years};
use crate::models::{LevelCode, SearchType};
use crate::view::ResultsView;

/// Shown whenever the request itself fails, as opposed to the server
/// answering with an error body.
pub const NETWORK_ERROR_MESSAGE: &str =
    "We encountered an error. Please check your network and try again.";

/// Terminal results browser. Runs the same flow as the web results page
/// against a running server: validate the form, fetch the full match set
/// once, then filter, paginate and expand locally.
pub struct ResultsBrowser {
    http: reqwest::Client,
    server: String,
    view: ResultsView,
    inflight: Option<CancellationToken>,
}

impl ResultsBrowser {
    pub fn new(server: &str) -> ResultsBrowser {
        ResultsBrowser {
            http: reqwest::Client::new(),
            server: server.trim_end_matches('/').to_string(),
            view: ResultsView::new(),
            inflight: None,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn view(&self) -> &ResultsView {
        &self.view
    }

    /// Years the form may offer. Falls back to the static range when the
    /// metadata endpoint is unreachable or empty.
    pub async fn available_years(&self) -> Vec<i32> {
        match self.fetch_meta().await {
            Ok(meta) if !meta.years.is_empty() => meta.years,
            Ok(_) => fallback_years(),
            Err(error) => {
                tracing::warn!(error = %error, "metadata unavailable, using fallback years");
                fallback_years()
            }
        }
    }

    async fn fetch_meta(&self) -> Result<MetaResponse> {
        let response = self
            .http
            .get(format!("{}/api/meta", self.server))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Run one search. A newer call supersedes any fetch still in flight:
    /// the old request is cancelled and its token can no longer apply, so a
    /// slow reply cannot land on this newer view state. Err carries the
    /// message to show the user.
    pub async fn fetch(&mut self, query: &ResultsQuery) -> Result<bool, String> {
        if let Some(previous) = self.inflight.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        self.inflight = Some(cancel.clone());
        let token = self.view.issue_token();

        let request = self
            .http
            .post(format!("{}/api/search", self.server))
            .json(&serde_json::json!({
                "searchType": query.search_type.as_str(),
                "searchValue": query.value,
                "level": query.level.as_str(),
                "year": query.year.to_string(),
            }))
            .send();

        let sent = tokio::select! {
            _ = cancel.cancelled() => return Ok(false),
            sent = request => sent,
        };

        let response = sent.map_err(|error| {
            tracing::debug!(error = %error, "search request failed");
            NETWORK_ERROR_MESSAGE.to_string()
        })?;

        if !response.status().is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Search failed".to_string());
            return Err(message);
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|_| NETWORK_ERROR_MESSAGE.to_string())?;

        Ok(self.view.apply_results(token, data.results))
    }

    fn toggle_row(&mut self, arg: &str) {
        let Some(index) = arg.parse::<usize>().ok().and_then(|i| i.checked_sub(1)) else {
            println!("Usage: x <row number>");
            return;
        };
        let record_id = self
            .view
            .page_rows()
            .get(index)
            .map(|row| row.record_id.clone());
        match record_id {
            Some(id) => self.view.toggle_expanded(&id),
            None => println!("No row {} on this page", index + 1),
        }
    }

    fn render(&self, query: &ResultsQuery) {
        let total = self.view.results().len();
        let shown = self.view.filtered().len();

        println!();
        println!(
            "{}: {}  |  {} {}",
            query.search_type.display_label(),
            query.value,
            query.level.display_name(),
            query.year
        );

        if total == 0 {
            println!("No results were found for your search criteria.");
            return;
        }
        if shown == 0 {
            println!(
                "No results match \"{}\". Try different keywords, or `c` to clear the filter.",
                self.view.filter()
            );
            return;
        }

        if let Some((start, end)) = self.view.page_span() {
            if self.view.filter().trim().is_empty() {
                println!(
                    "{} results found (showing {}-{}, page {}/{})",
                    total,
                    start,
                    end,
                    self.view.page(),
                    self.view.total_pages()
                );
            } else {
                println!(
                    "{} of {} results (showing {}-{}, page {}/{})",
                    shown,
                    total,
                    start,
                    end,
                    self.view.page(),
                    self.view.total_pages()
                );
            }
        }

        for (index, row) in self.view.page_rows().iter().enumerate() {
            let expanded = self.view.is_expanded(&row.record_id);
            let marker = if expanded { "-" } else { "+" };
            println!(
                "{:>3} {} {}  (center {})",
                index + 1,
                marker,
                row.student_name,
                row.center_number
            );
            if expanded {
                println!("      {}", row.center_name);
                println!("      {} - {}", row.level_display(), row.year);
                if !row.grades().is_empty() {
                    println!("      Grades: {}", row.grades().join(", "));
                }
                if !row.papers().is_empty() {
                    println!("      Papers passed: {}", row.papers().join(", "));
                }
                println!("      Entered: {}", row.entry_date);
            }
        }
    }
}

/// Entry point for the `browse` subcommand
pub async fn run(
    server: String,
    search_type: Option<SearchType>,
    value: Option<String>,
    level: Option<LevelCode>,
    year: Option<i32>,
) -> Result<()> {
    // Same terminal state as the results page with incomplete URL
    // parameters: report it, attempt no search.
    let (Some(search_type), Some(value), Some(level), Some(year)) =
        (search_type, value, level, year)
    else {
        println!("Missing search parameters: --type, --value, --level and --year are all required.");
        return Ok(());
    };

    let mut browser = ResultsBrowser::new(&server);

    let years = browser.available_years().await;
    let form = SearchForm {
        search_type,
        value,
        level: Some(level),
        year: Some(year),
    };
    if let Err(error) = form.validate(&years) {
        println!("{error}");
        return Ok(());
    }
    let query = form.query().context("validated form missing level or year")?;

    if let Ok(url) = query.results_url(browser.server()) {
        println!("Results page: {url}");
    }

    if let Err(message) = browser.fetch(&query).await {
        println!("{message}");
        return Ok(());
    }

    browser.render(&query);
    print_help();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "q" => break,
            "n" => browser.view.next_page(),
            "p" => browser.view.prev_page(),
            "g" => match rest.parse::<usize>() {
                Ok(page) => browser.view.set_page(page),
                Err(_) => println!("Usage: g <page>"),
            },
            "f" => browser.view.set_filter(rest),
            "c" => browser.view.set_filter(""),
            "x" => browser.toggle_row(rest),
            "r" => {
                if let Err(message) = browser.fetch(&query).await {
                    println!("{message}");
                }
            }
            "" => {}
            _ => print_help(),
        }

        browser.render(&query);
    }

    Ok(())
}

fn print_help() {
    println!();
    println!("Commands: f <text> filter within results | c clear filter");
    println!("          n/p next/previous page | g <page> go to page");
    println!("          x <row> expand/collapse a row | r refetch | q quit");
}
