//! Pagination of ranked match lists (100 entries per page)

/// Page size for all paginated lists
pub const PAGE_SIZE: usize = 100;

/// Pagination metadata calculated from the total number of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    pub total_pages: usize,
    /// Index of the first entry on `page`
    pub offset: usize,
}

/// Clamp `requested_page` to [1, total_pages] and compute its offset
///
/// # Examples
/// ```
/// use tastematch_api::pagination::calculate_pagination;
///
/// let p = calculate_pagination(250, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 100);
///
/// // Out-of-bounds pages are clamped
/// let p = calculate_pagination(250, 99);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: i64) -> Pagination {
    let total_pages = total_results.div_ceil(PAGE_SIZE);
    let requested = usize::try_from(requested_page.max(1)).unwrap_or(usize::MAX);
    let page = requested.min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        offset: (page - 1) * PAGE_SIZE,
    }
}

/// Keep the entries of `page`, or everything when no page was requested
pub fn page_of<T>(items: Vec<T>, page: Option<i64>) -> Vec<T> {
    match page {
        None => items,
        Some(page) => {
            let p = calculate_pagination(items.len(), page);
            items.into_iter().skip(p.offset).take(PAGE_SIZE).collect()
        }
    }
}
