use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Rows per leaderboard page.
pub const PAGE_SIZE: usize = 25;

/// Number of pages needed for `total_items` rows. An empty result still
/// renders as a single page.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    PAGE_SIZE as u32
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if self.page_size < 1 || self.page_size > 100 {
            return Err("page_size must be between 1 and 100".to_string());
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// The requested window of an in-memory result set.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.limit()).min(items.len());
        &items[start..end]
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(page: u32, page_size: u32, total_items: i64) -> Self {
        let total_pages = total_pages(total_items.max(0) as usize, page_size as usize) as u32;
        Self {
            page,
            page_size,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, page_size: u32, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, page_size, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_has_a_floor_of_one() {
        assert_eq!(total_pages(0, PAGE_SIZE), 1);
        assert_eq!(total_pages(1, PAGE_SIZE), 1);
        assert_eq!(total_pages(25, PAGE_SIZE), 1);
        assert_eq!(total_pages(26, PAGE_SIZE), 2);
        assert_eq!(total_pages(60, PAGE_SIZE), 3);
    }

    #[test]
    fn test_slice_clamps_to_available_rows() {
        let rows: Vec<u32> = (1..=30).collect();
        let params = PaginationParams {
            page: 2,
            page_size: 25,
        };
        assert_eq!(params.slice(&rows), &[26, 27, 28, 29, 30]);

        let past_end = PaginationParams {
            page: 4,
            page_size: 25,
        };
        assert!(past_end.slice(&rows).is_empty());
    }

    #[test]
    fn test_meta_reports_single_page_for_empty_results() {
        let meta = PaginationMeta::new(1, 25, 0);
        assert_eq!(meta.total_pages, 1);
    }
}
