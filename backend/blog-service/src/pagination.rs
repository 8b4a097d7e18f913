//! Fixed-size page slicing
//!
//! Page numbers come straight from the `?page=` query string. Anything that is
//! not an integer selects the first page; integers outside `1..=num_pages`
//! select the last page. An empty listing still has one (empty) page.

use serde::Deserialize;

/// `?page=` query parameter, kept as raw text so malformed values are tolerated
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: i64,
    total: i64,
}

impl Paginator {
    pub fn new(per_page: i64, total: i64) -> Self {
        Self {
            per_page: per_page.max(1),
            total: total.max(0),
        }
    }

    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a requested page to a valid 1-based page number
    pub fn page_number(&self, requested: Option<&str>) -> i64 {
        let Some(number) = requested.and_then(|raw| raw.trim().parse::<i64>().ok()) else {
            return 1;
        };

        if number < 1 || number > self.num_pages() {
            self.num_pages()
        } else {
            number
        }
    }

    /// `(limit, offset)` for the given valid page number
    pub fn bounds(&self, number: i64) -> (i64, i64) {
        (self.per_page, (number - 1) * self.per_page)
    }

    pub fn page<T>(&self, number: i64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> i64 {
        (self.number - 1).max(1)
    }

    pub fn next_page_number(&self) -> i64 {
        (self.number + 1).min(self.num_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pages() {
        assert_eq!(Paginator::new(10, 0).num_pages(), 1);
        assert_eq!(Paginator::new(10, 10).num_pages(), 1);
        assert_eq!(Paginator::new(10, 11).num_pages(), 2);
        assert_eq!(Paginator::new(10, 15).num_pages(), 2);
    }

    #[test]
    fn resolves_requested_page() {
        let paginator = Paginator::new(10, 15);
        assert_eq!(paginator.page_number(None), 1);
        assert_eq!(paginator.page_number(Some("2")), 2);
        assert_eq!(paginator.page_number(Some("abc")), 1);
        assert_eq!(paginator.page_number(Some("")), 1);
        assert_eq!(paginator.page_number(Some("99")), 2);
        assert_eq!(paginator.page_number(Some("0")), 2);
        assert_eq!(paginator.page_number(Some("-3")), 2);
    }

    #[test]
    fn second_page_holds_remainder() {
        let paginator = Paginator::new(10, 15);
        assert_eq!(paginator.bounds(2), (10, 10));

        let page = paginator.page(2, vec![0; 5]);
        assert!(page.has_previous());
        assert!(!page.has_next());
        assert_eq!(page.previous_page_number(), 1);
        assert_eq!(page.items.len(), 5);
    }

    #[test]
    fn empty_listing_has_single_page() {
        let paginator = Paginator::new(10, 0);
        assert_eq!(paginator.page_number(Some("5")), 1);

        let page = paginator.page::<()>(1, Vec::new());
        assert!(!page.has_other_pages());
        assert!(!page.has_previous());
        assert!(!page.has_next());
    }
}
