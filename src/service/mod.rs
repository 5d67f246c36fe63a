//! Use cases shared by the form routes and the JSON API.
//!
//! Every writing use case follows the same order: authorize, check the
//! anti-forgery token, validate, check uniqueness, then write and refresh
//! derived columns inside one transaction.

pub mod accounts;
pub mod follows;
pub mod tags;
pub mod themes;
pub mod websites;

use crate::constants::PAGE_SIZE;
use crate::error::AppError;
use crate::middleware::Intent;
use serde::Serialize;

/// Result of a mutation whose anti-forgery token may have been rejected.
#[derive(Debug, PartialEq)]
pub enum Mutation<T> {
    Applied(T),
    /// Token missing or mismatched. Nothing was written and the caller answers
    /// as if the mutation succeeded.
    Skipped,
}

impl<T> Mutation<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Mutation::Applied(value) => Some(value),
            Mutation::Skipped => None,
        }
    }
}

pub(crate) fn skipped<T>(intent: Intent, id: i32) -> Result<Mutation<T>, AppError> {
    log::warn!(
        "Ignoring {} on {}: anti-forgery token missing or mismatched",
        intent.as_str(),
        id
    );
    Ok(Mutation::Skipped)
}

/// One page of a listing.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u64, total_items: u64) -> Self {
        Self {
            items,
            page,
            total_items,
            total_pages: page_count(total_items),
        }
    }
}

fn page_count(total_items: u64) -> u64 {
    (total_items + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Zero-based page index to fetch, or `None` when `page` lies past the last
/// page. Keeps the offset computed by the paginator within range.
pub(crate) fn page_index(page: u64, total_items: u64) -> Option<usize> {
    if page == 0 || page > page_count(total_items) {
        return None;
    }
    usize::try_from(page - 1).ok()
}

/// Trims a filter value and drops it when empty.
pub(crate) fn filter_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_counts() {
        assert_eq!(Page::<i32>::new(vec![], 1, 0).total_pages, 0);
        assert_eq!(Page::<i32>::new(vec![], 1, 10).total_pages, 1);
        assert_eq!(Page::<i32>::new(vec![], 2, 11).total_pages, 2);
        assert_eq!(Page::<i32>::new(vec![], 3, 25).total_pages, 3);
    }

    #[test]
    fn test_page_index_stays_in_range() {
        assert_eq!(page_index(1, 25), Some(0));
        assert_eq!(page_index(3, 25), Some(2));
        assert_eq!(page_index(4, 25), None);
        assert_eq!(page_index(1, 0), None);
        assert_eq!(page_index(0, 25), None);
        assert_eq!(page_index(u64::MAX, 25), None);
    }

    #[test]
    fn test_mutation_helpers() {
        assert!(Mutation::Applied(1).is_applied());
        assert_eq!(Mutation::Applied(1).applied(), Some(1));
        assert_eq!(Mutation::<i32>::Skipped.applied(), None);
    }

    #[test]
    fn test_filter_text() {
        assert_eq!(filter_text(&Some("  rust ".to_owned())), Some("rust"));
        assert_eq!(filter_text(&Some("   ".to_owned())), None);
        assert_eq!(filter_text(&None), None);
    }
}
