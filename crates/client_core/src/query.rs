use shared::{
    domain::{ContentKind, SortKey},
    protocol::SearchParams,
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which part of the query a transition touched. Text edits are debounced,
/// everything else is fetched right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryChange {
    Text,
    PageIndex,
    PageSize,
    Sort,
}

impl QueryChange {
    pub fn is_debounced(self) -> bool {
        matches!(self, QueryChange::Text)
    }
}

/// Filter, page and sort input of a search.
///
/// Changing the filter criteria (text, page size, sort) always lands on the
/// first page. Only [`QueryState::set_page_index`] moves between pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    text: String,
    page_index: u32,
    page_size: u32,
    sort_key: SortKey,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            text: String::new(),
            page_index: 0,
            page_size: page_size.max(1),
            sort_key: SortKey::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> QueryChange {
        self.text = text.into();
        self.page_index = 0;
        QueryChange::Text
    }

    pub fn set_page_size(&mut self, page_size: u32) -> QueryChange {
        self.page_size = page_size.max(1);
        self.page_index = 0;
        QueryChange::PageSize
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) -> QueryChange {
        self.sort_key = sort_key;
        self.page_index = 0;
        QueryChange::Sort
    }

    /// No bounds check; the caller validates against the known page count.
    pub fn set_page_index(&mut self, page_index: u32) -> QueryChange {
        self.page_index = page_index;
        QueryChange::PageIndex
    }

    /// Effective query sent to the search endpoint. Whitespace-only text is
    /// no filter at all.
    pub fn to_search_params(&self, kind: Option<ContentKind>) -> SearchParams {
        let text = self.text.trim();
        SearchParams {
            kind,
            q: (!text.is_empty()).then(|| text.to_string()),
            page: self.page_index,
            size: self.page_size,
            sort: self.sort_key,
        }
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
