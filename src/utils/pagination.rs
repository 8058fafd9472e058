use serde::Serialize;

pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Offset/limit window resolved from the `page` and `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Pages are 1-based; zero or missing values fall back to the first page
    /// and the resource's default limit. The limit is capped at `MAX_LIMIT`.
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(MAX_LIMIT);
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Signed limit as the driver expects it.
    pub fn limit_i64(&self) -> i64 {
        self.limit as i64
    }

    pub fn has_next(&self, total: u64) -> bool {
        self.page.saturating_mul(self.limit) < total
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub success: bool,
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            success: true,
            items,
            page: request.page,
            limit: request.limit,
            total,
            total_pages: request.total_pages(total),
            has_next: request.has_next(total),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            success: self.success,
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
            has_next: self.has_next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_ten_with_limit_six_is_the_last() {
        let request = PageRequest::new(Some(2), Some(6), DEFAULT_LIMIT);
        assert_eq!(request.skip(), 6);
        assert!(!request.has_next(10));
        assert_eq!(request.total_pages(10), 2);

        let all: Vec<u32> = (0..10).collect();
        let window: Vec<_> = all
            .iter()
            .skip(request.skip() as usize)
            .take(request.limit as usize)
            .collect();
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn first_page_reports_more_items() {
        let request = PageRequest::new(Some(1), Some(6), DEFAULT_LIMIT);
        assert_eq!(request.skip(), 0);
        assert!(request.has_next(10));
    }

    #[test]
    fn zero_and_missing_values_use_defaults() {
        assert_eq!(
            PageRequest::new(Some(0), Some(0), 6),
            PageRequest { page: 1, limit: 6 }
        );
        assert_eq!(PageRequest::new(None, None, 10), PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(PageRequest::new(None, Some(5000), 10).limit, MAX_LIMIT);
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let request = PageRequest::new(None, None, 10);
        assert_eq!(request.total_pages(0), 0);
        assert!(!request.has_next(0));
    }
}
