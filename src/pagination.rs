use serde::{Deserialize, Serialize};

/// Fixed page size of the home and per-user feeds.
pub const PER_PAGE: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

/// Query-string values arrive as strings; anything that does not parse as a
/// number falls back to page 1 instead of failing the request.
fn lenient_page<'de, D>(de: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Str(String),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Num(n) => n,
        Raw::Str(s) => s.parse().unwrap_or(1),
    })
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: i64, total: i64) -> Self {
        Self {
            items,
            page,
            per_page: PER_PAGE,
            total,
            total_pages: total_pages(total, PER_PAGE),
        }
    }
}

/// Row offset for a 1-based page number, or None when the page is out of
/// range. Page 1 is always in range so an empty feed still renders; any
/// later page must start before the end of the data. Page numbers large
/// enough to overflow the offset are out of range by definition.
pub fn page_offset(page: i64, total: i64, per_page: i64) -> Option<i64> {
    if page < 1 {
        return None;
    }
    let offset = (page - 1).checked_mul(per_page)?;
    if page > 1 && offset >= total {
        return None;
    }
    Some(offset)
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total == 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_rows_paginate_into_three_pages() {
        // 12 posts: page 1 holds the 5 newest, page 3 the remaining 2.
        assert_eq!(page_offset(1, 12, PER_PAGE), Some(0));
        assert_eq!(page_offset(2, 12, PER_PAGE), Some(5));
        assert_eq!(page_offset(3, 12, PER_PAGE), Some(10));
        assert_eq!(page_offset(4, 12, PER_PAGE), None);
        assert_eq!(total_pages(12, PER_PAGE), 3);
    }

    #[test]
    fn first_page_of_empty_feed_is_in_range() {
        assert_eq!(page_offset(1, 0, PER_PAGE), Some(0));
        assert_eq!(total_pages(0, PER_PAGE), 1);
    }

    #[test]
    fn pages_below_one_are_out_of_range() {
        assert_eq!(page_offset(0, 12, PER_PAGE), None);
        assert_eq!(page_offset(-3, 12, PER_PAGE), None);
    }

    #[test]
    fn huge_page_numbers_are_out_of_range_not_a_panic() {
        assert_eq!(page_offset(i64::MAX, 12, PER_PAGE), None);
        assert_eq!(page_offset(i64::MAX - 1, 12, PER_PAGE), None);
        assert_eq!(page_offset(i64::MIN, 12, PER_PAGE), None);
    }

    #[test]
    fn page_query_tolerates_garbage_values() {
        let q: PageQuery = serde_json::from_str(r#"{"page":"7"}"#).unwrap();
        assert_eq!(q.page, 7);
        let q: PageQuery = serde_json::from_str(r#"{"page":"abc"}"#).unwrap();
        assert_eq!(q.page, 1);
        let q: PageQuery = serde_json::from_str(r#"{"page":""}"#).unwrap();
        assert_eq!(q.page, 1);
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page, 1);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(page_offset(2, 10, PER_PAGE), Some(5));
        assert_eq!(page_offset(3, 10, PER_PAGE), None);
        assert_eq!(total_pages(10, PER_PAGE), 2);
    }
}
