use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

const fn default_page() -> u32 {
    DEFAULT_PAGE
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Slices an already ordered list. Pages past the end are empty.
    pub fn from_items(items: Vec<T>, query: PageQuery) -> Self {
        let total = items.len();
        let start = (query.page.saturating_sub(1) as usize).saturating_mul(query.limit as usize);
        let items = items
            .into_iter()
            .skip(start)
            .take(query.limit as usize)
            .collect();

        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
        }
    }
}
