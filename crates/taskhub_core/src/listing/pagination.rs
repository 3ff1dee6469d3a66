//! Fixed-size pagination.
//!
//! Page numbers come straight from the request. A value that is not an
//! integer selects the first page; an integer outside `1..=num_pages`
//! selects the last page, including integers too large for `i64`.

use serde::Serialize;

/// Tasks shown per listing page.
pub const TASKS_PAGE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served.
    pub number: usize,
    /// Always at least 1, even for an empty result.
    pub num_pages: usize,
    /// Item count across all pages.
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Cuts `items` into pages of `page_size` and returns the requested one.
pub fn paginate<T>(items: Vec<T>, page_size: usize, requested: Option<&str>) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let num_pages = total_items.div_ceil(page_size).max(1);
    let number = resolve_page_number(requested, num_pages);

    let items = items
        .into_iter()
        .skip((number - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        number,
        num_pages,
        total_items,
    }
}

fn resolve_page_number(requested: Option<&str>, num_pages: usize) -> usize {
    let Some(raw) = requested else {
        return 1;
    };
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(value) if value >= 1 && value as u64 <= num_pages as u64 => value as usize,
        Ok(_) => num_pages,
        Err(_) if is_integer_literal(raw) => num_pages,
        Err(_) => 1,
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{paginate, TASKS_PAGE_SIZE};

    fn numbers(count: usize) -> Vec<usize> {
        (1..=count).collect()
    }

    #[test]
    fn first_page_by_default() {
        let page = paginate(numbers(7), TASKS_PAGE_SIZE, None);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.total_items, 7);
        assert!(!page.has_previous());
        assert!(page.has_next());
    }

    #[test]
    fn last_page_is_partial() {
        let page = paginate(numbers(7), TASKS_PAGE_SIZE, Some("3"));
        assert_eq!(page.items, vec![7]);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn non_numeric_page_falls_back_to_first() {
        let page = paginate(numbers(7), TASKS_PAGE_SIZE, Some("abc"));
        assert_eq!(page.number, 1);
    }

    #[test]
    fn out_of_range_page_falls_back_to_last() {
        assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some("99")).number, 3);
        assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some("0")).number, 3);
        assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some("-2")).number, 3);
    }

    #[test]
    fn integer_beyond_i64_falls_back_to_last() {
        for raw in ["99999999999999999999", "-99999999999999999999", "+99999999999999999999"] {
            assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some(raw)).number, 3, "{raw}");
        }
        assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some("9e99")).number, 1);
        assert_eq!(paginate(numbers(7), TASKS_PAGE_SIZE, Some("-")).number, 1);
    }

    #[test]
    fn empty_input_has_one_empty_page() {
        let page = paginate(Vec::<usize>::new(), TASKS_PAGE_SIZE, Some("4"));
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
    }
}
