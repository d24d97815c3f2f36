//! Splitting lists into pages and describing the page links around the current page.

use serde::Serialize;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows per page.
    pub page_size: u64,
    /// The maximum number of page links to show around the current page.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            page_size: 10,
            max_pages: 5,
        }
    }
}

/// Where a page sits within a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// The 1-based page number, always within `1..=page_count`.
    pub page: u64,
    /// The number of rows per page.
    pub page_size: u64,
    /// The number of pages, at least one even for an empty list.
    pub page_count: u64,
    /// The number of rows across all pages.
    pub total_rows: u64,
}

impl PageInfo {
    /// Describe page `requested_page` of a list with `total_rows` rows.
    ///
    /// Pages before the first or after the last are clamped to the nearest
    /// page that exists. A page size of zero is treated as one.
    pub fn new(requested_page: u64, page_size: u64, total_rows: u64) -> Self {
        let page_size = page_size.max(1);
        let page_count = total_rows.div_ceil(page_size).max(1);

        Self {
            page: requested_page.clamp(1, page_count),
            page_size,
            page_count,
            total_rows,
        }
    }

    /// The rows of `items` on this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = ((self.page - 1) * self.page_size).min(items.len() as u64) as usize;
        let end = (start as u64 + self.page_size).min(items.len() as u64) as usize;

        &items[start..end]
    }
}

/// One link in a row of page links.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum PaginationIndicator {
    /// A link to another page.
    Page(u64),
    /// The page being viewed.
    CurrPage(u64),
    /// A gap of hidden pages.
    Ellipsis,
    /// A link to the next page.
    NextButton(u64),
    /// A link to the previous page.
    BackButton(u64),
}

/// Lay out the page links for `curr_page` of `page_count` pages, showing at
/// most `max_pages` numbered pages around the current one plus links to the
/// first and last pages.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let (first, last) = page_window(curr_page, page_count, max_pages);
    let mut indicators = Vec::with_capacity(max_pages as usize + 6);

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if first > 1 {
        indicators.extend([PaginationIndicator::Page(1), PaginationIndicator::Ellipsis]);
    }

    indicators.extend((first..=last).map(|page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    }));

    if last < page_count {
        indicators.extend([
            PaginationIndicator::Ellipsis,
            PaginationIndicator::Page(page_count),
        ]);
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

/// The first and last numbered pages to show, centred on `curr_page` where
/// possible and always `max_pages` wide unless there are fewer pages.
fn page_window(curr_page: u64, page_count: u64, max_pages: u64) -> (u64, u64) {
    if page_count <= max_pages {
        return (1, page_count);
    }

    let latest_start = page_count - max_pages + 1;
    let first = curr_page.saturating_sub(max_pages / 2).clamp(1, latest_start);

    (first, first + max_pages - 1)
}

#[cfg(test)]
mod page_info_tests {
    use super::PageInfo;

    #[test]
    fn empty_list_has_one_page() {
        let got = PageInfo::new(1, 10, 0);

        assert_eq!(got.page_count, 1);
        assert_eq!(got.page, 1);
        assert!(got.slice::<u8>(&[]).is_empty());
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(PageInfo::new(1, 10, 10).page_count, 1);
        assert_eq!(PageInfo::new(1, 10, 11).page_count, 2);
        assert_eq!(PageInfo::new(1, 10, 25).page_count, 3);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        assert_eq!(PageInfo::new(0, 10, 25).page, 1);
        assert_eq!(PageInfo::new(99, 10, 25).page, 3);
    }

    #[test]
    fn slice_returns_rows_of_page() {
        let rows: Vec<u32> = (1..=25).collect();

        assert_eq!(PageInfo::new(1, 10, 25).slice(&rows), &rows[0..10]);
        assert_eq!(PageInfo::new(3, 10, 25).slice(&rows), &[21, 22, 23, 24, 25]);
    }
}
