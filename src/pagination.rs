use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 100;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// Common query parameters for list endpoints: `?page=&limit=&search=`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
        }
    }
}

impl ListParams {
    /// Page and limit clamped to sane bounds (page >= 1, 1 <= limit <= 100).
    pub fn normalized(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, MAX_LIMIT))
    }

    pub fn offset(&self) -> i64 {
        let (page, limit) = self.normalized();
        (page - 1) * limit
    }

    /// Lowercased `%term%` pattern, or None when search is absent or blank.
    pub fn like_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()))
    }
}

/// `(LOWER(col) LIKE ? OR ...)` across the given columns; one bind per column.
pub fn search_clause(columns: &[&str]) -> String {
    let parts: Vec<String> = columns
        .iter()
        .map(|c| format!("LOWER({c}) LIKE ?"))
        .collect();
    format!("({})", parts.join(" OR "))
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

/// List response wrapper: `{ data, pagination }`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            pagination: Pagination {
                total,
                page,
                limit,
                total_pages: total_pages(total, limit),
            },
        }
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_page_minus_one_times_limit() {
        let params = ListParams {
            page: 3,
            limit: 25,
            search: None,
        };
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let params = ListParams {
            page: 0,
            limit: 5000,
            search: None,
        };
        assert_eq!(params.normalized(), (1, 100));
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(99, 25), 4);
    }

    #[test]
    fn like_term_trims_lowercases_and_wraps() {
        let params = ListParams {
            page: 1,
            limit: 10,
            search: Some("  Acme ".to_string()),
        };
        assert_eq!(params.like_term().as_deref(), Some("%acme%"));

        let blank = ListParams {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.like_term().is_none());
    }

    #[test]
    fn search_clause_covers_all_columns() {
        assert_eq!(
            search_clause(&["name", "email"]),
            "(LOWER(name) LIKE ? OR LOWER(email) LIKE ?)"
        );
    }

    #[test]
    fn paginated_serializes_wrapper_shape() {
        let page = Paginated::new(vec!["a", "b"], 42, 2, 10);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["data"], serde_json::json!(["a", "b"]));
        assert_eq!(json["pagination"]["total"], 42);
        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["limit"], 10);
        assert_eq!(json["pagination"]["totalPages"], 5);
    }

    #[test]
    fn missing_params_fall_back_to_defaults() {
        let params: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert!(params.search.is_none());
    }
}
