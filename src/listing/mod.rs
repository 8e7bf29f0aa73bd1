//! Search and pagination over a mirrored record list.

use crate::models::{Doc, Entity};

pub(crate) const PAGE_SIZE: usize = 5;

/// True when any field value, or the identifier, contains `term_lower`.
/// `term_lower` must already be lower-cased.
pub(crate) fn matches<E: Entity>(doc: &Doc<E>, term_lower: &str) -> bool {
    if term_lower.is_empty() {
        return true;
    }
    doc.id.to_lowercase().contains(term_lower)
        || doc
            .data
            .values()
            .iter()
            .any(|v| v.to_lowercase().contains(term_lower))
}

/// Records matching `term`, case-insensitively, in mirror order.
pub(crate) fn filter_docs<E: Entity>(docs: &[Doc<E>], term: &str) -> Vec<Doc<E>> {
    let term_lower = term.to_lowercase();
    docs.iter()
        .filter(|d| matches(d, &term_lower))
        .cloned()
        .collect()
}

pub(crate) fn total_pages(count: usize) -> usize {
    count.div_ceil(PAGE_SIZE)
}

/// Search term and 1-based page number of one record page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ListingState {
    pub term: String,
    pub page: usize,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            term: String::new(),
            page: 1,
        }
    }
}

impl ListingState {
    /// A new term always starts over at page 1.
    pub fn set_term(&mut self, term: impl Into<String>) {
        self.term = term.into();
        self.page = 1;
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self, total_pages: usize) -> bool {
        self.page < total_pages
    }

    pub fn prev(&mut self) {
        if self.can_prev() {
            self.page -= 1;
        }
    }

    pub fn next(&mut self, total_pages: usize) {
        if self.can_next(total_pages) {
            self.page += 1;
        }
    }
}

/// The slice of records on screen.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PageView<E> {
    pub rows: Vec<Doc<E>>,
    /// Page actually shown; pulled back when the list shrank under it.
    pub page: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
}

pub(crate) fn page_view<E: Entity>(docs: &[Doc<E>], state: &ListingState) -> PageView<E> {
    let filtered = filter_docs(docs, &state.term);
    let total = total_pages(filtered.len());
    let page = state.page.clamp(1, total.max(1));

    let rows = filtered
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    PageView {
        rows,
        page,
        total_pages: total,
        filtered_count: filtered.len(),
    }
}
