//! Page arithmetic and the URL representation of the current page.

use serde::{Deserialize, Serialize};

/// How a table decides whether "Next" leads anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextPagePolicy {
    /// A full page suggests more rows exist. Can enable "Next" onto an empty
    /// page when the total is an exact multiple of the page size.
    #[default]
    FullPage,
    /// A full page that also ends before `count`.
    ExactCount,
}

/// A 1-based page of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Page numbers below 1 are clamped to 1 and a zero size to 1.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.size)
    }

    pub fn previous(&self) -> Self {
        Self::new(self.page.saturating_sub(1), self.size)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether the page just received should trigger a prefetch of the
    /// next one: only a full page does.
    pub fn should_prefetch_next(&self, received: usize) -> bool {
        received as u64 == self.limit()
    }

    pub fn has_next(&self, received: usize, count: u64, policy: NextPagePolicy) -> bool {
        let full = self.should_prefetch_next(received);
        match policy {
            NextPagePolicy::FullPage => full,
            NextPagePolicy::ExactCount => full && self.skip() + (received as u64) < count,
        }
    }
}

/// Number of pages needed for `count` rows; at least 1 so the label reads
/// "Page 1 of 1" on an empty table.
pub fn total_pages(count: u64, size: u32) -> u64 {
    count.div_ceil(u64::from(size.max(1))).max(1)
}

/// Read the `page` search parameter from a query string such as
/// `page=3&tab=all` (leading `?` allowed). Missing, malformed or zero
/// values mean page 1.
pub fn page_from_query(query: &str) -> u32 {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "page")
        .and_then(|(_, v)| v.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Replace (or add) the `page` search parameter, keeping the others.
pub fn with_page_in_query(query: &str, page: u32) -> String {
    let mut pairs: Vec<String> = query
        .trim_start_matches('?')
        .split('&')
        .filter(|p| !p.is_empty() && !p.starts_with("page="))
        .map(str::to_string)
        .collect();
    pairs.push(format!("page={page}"));
    pairs.join("&")
}
