use std::collections::HashSet;

use crate::models::SearchResult;

/// Number of result rows shown per page
pub const PAGE_SIZE: usize = 40;

/// Ties an in-flight fetch to the view state that issued it. A response is
/// applied only while its token is still the newest one handed out, so a
/// slow reply can never overwrite the results of a later search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// State of the results page: the fetched set plus the local filter,
/// pagination, and row expansion applied on top of it. Owned by the view,
/// discarded with it; nothing here is shared or global.
#[derive(Debug)]
pub struct ResultsView {
    results: Vec<SearchResult>,
    filter: String,
    page: usize,
    expanded: HashSet<String>,
    latest_token: u64,
}

impl ResultsView {
    pub fn new() -> ResultsView {
        ResultsView {
            results: Vec::new(),
            filter: String::new(),
            page: 1,
            expanded: HashSet::new(),
            latest_token: 0,
        }
    }

    /// Hand out the token for the next fetch, superseding all earlier ones
    pub fn issue_token(&mut self) -> RequestToken {
        self.latest_token += 1;
        RequestToken(self.latest_token)
    }

    /// Install a fetched result set. Returns false and leaves the view
    /// untouched when the token has been superseded by a newer fetch.
    pub fn apply_results(&mut self, token: RequestToken, results: Vec<SearchResult>) -> bool {
        if token.0 != self.latest_token {
            return false;
        }
        self.results = results;
        self.filter.clear();
        self.page = 1;
        self.expanded.clear();
        true
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Change the within-results filter; back to page 1, all rows collapsed
    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.to_string();
        self.page = 1;
        self.expanded.clear();
    }

    // query must already be lowercased
    fn matches(result: &SearchResult, query: &str) -> bool {
        result.student_name.to_lowercase().contains(query)
            || result.center_name.to_lowercase().contains(query)
            || result.center_number.to_lowercase().contains(query)
            || result.level.to_lowercase().contains(query)
            || result.year.to_string().contains(query)
            || result.papers_passed.to_lowercase().contains(query)
            || result.student_grades.to_lowercase().contains(query)
    }

    /// Rows surviving the local filter, in fetch order. An empty or
    /// whitespace query keeps everything.
    pub fn filtered(&self) -> Vec<&SearchResult> {
        let query = self.filter.trim().to_lowercase();
        if query.is_empty() {
            return self.results.iter().collect();
        }
        self.results
            .iter()
            .filter(|result| Self::matches(result, &query))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(PAGE_SIZE)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows of the current page
    pub fn page_rows(&self) -> Vec<&SearchResult> {
        let start = (self.page - 1) * PAGE_SIZE;
        self.filtered().into_iter().skip(start).take(PAGE_SIZE).collect()
    }

    /// 1-based index range of the rows on the current page, None when the
    /// filtered set is empty. Feeds the "showing X-Y of N" summary.
    pub fn page_span(&self) -> Option<(usize, usize)> {
        let shown = self.filtered().len();
        if shown == 0 {
            return None;
        }
        let start = (self.page - 1) * PAGE_SIZE + 1;
        let end = (start + PAGE_SIZE - 1).min(shown);
        Some((start, end))
    }

    /// Jump to a page, clamped to the filtered set; all rows collapse
    pub fn set_page(&mut self, page: usize) {
        let total = self.total_pages().max(1);
        self.page = page.clamp(1, total);
        self.expanded.clear();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    /// Flip one row's detail section without touching the others
    pub fn toggle_expanded(&mut self, record_id: &str) {
        if !self.expanded.remove(record_id) {
            self.expanded.insert(record_id.to_string());
        }
    }

    pub fn is_expanded(&self, record_id: &str) -> bool {
        self.expanded.contains(record_id)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }
}

impl Default for ResultsView {
    fn default() -> ResultsView {
        ResultsView::new()
    }
}
