use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Resolve to `(page, limit)` with page >= 1 and limit within `1..=MAX_PAGE_SIZE`.
    pub fn resolve(&self, default_limit: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }

    pub fn offset(page: u32, limit: u32) -> i64 {
        i64::from(page - 1) * i64::from(limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let limit_i = i64::from(limit);
        Self {
            total,
            page,
            limit,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}
