use axum::http::header::HeaderMap;
use sea_orm::{EntityTrait, QuerySelect, Select};

use crate::errors::CrudError;

/// Window `select` to the given 1-based page.
///
/// # Errors
///
/// `InvalidPagination` when `page` or `elements_per_page` is zero.
pub fn apply_pagination<E: EntityTrait>(
    select: Select<E>,
    page: u64,
    elements_per_page: u64,
) -> Result<Select<E>, CrudError> {
    let (offset, limit) = page_window(page, elements_per_page)?;
    Ok(select.offset(offset).limit(limit))
}

/// `(offset, limit)` of a 1-based page.
///
/// # Errors
///
/// `InvalidPagination` when `page` or `elements_per_page` is zero.
pub fn page_window(page: u64, elements_per_page: u64) -> Result<(u64, u64), CrudError> {
    if elements_per_page == 0 {
        return Err(CrudError::invalid_pagination(
            "the option 'elementsPerPage' must be greater than zero",
        ));
    }
    if page == 0 {
        return Err(CrudError::invalid_pagination(
            "the option 'page' must be greater than zero",
        ));
    }
    let offset = elements_per_page.saturating_mul(page - 1);
    Ok((offset, elements_per_page))
}

/// Number of pages needed for `total_count` items; zero items make zero pages.
#[must_use]
pub const fn page_count(total_count: u64, elements_per_page: u64) -> u64 {
    if elements_per_page == 0 {
        return 0;
    }
    total_count.div_ceil(elements_per_page)
}

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect()
}

/// Build the `Content-Range` header of a paginated JSON listing.
///
/// The range end is inclusive and clamped to the last existing item, e.g.
/// `articles 10-19/25`. An empty listing yields `articles 0-0/0`.
#[must_use]
pub fn calculate_content_range(
    offset: u64,
    limit: u64,
    total_count: u64,
    resource_name: &str,
) -> HeaderMap {
    let last = offset
        .saturating_add(limit)
        .min(total_count)
        .saturating_sub(1)
        .max(offset.min(total_count.saturating_sub(1)));
    let first = offset.min(last);

    let safe_name = sanitize_resource_name(resource_name);
    let content_range = format!("{safe_name} {first}-{last}/{total_count}");

    let mut headers = HeaderMap::new();
    if let Ok(value) = content_range.parse() {
        headers.insert("Content-Range", value);
    } else if let Ok(value) = format!("items {first}-{last}/{total_count}").parse() {
        headers.insert("Content-Range", value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::post;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 10).unwrap(), (0, 10));
        assert_eq!(page_window(2, 10).unwrap(), (10, 10));
        assert_eq!(page_window(3, 25).unwrap(), (50, 25));
    }

    #[test]
    fn test_zero_values_are_rejected() {
        assert!(matches!(page_window(1, 0), Err(CrudError::InvalidPagination { .. })));
        assert!(matches!(page_window(0, 10), Err(CrudError::InvalidPagination { .. })));
    }

    #[test]
    fn test_apply_pagination_sql() {
        let sql = apply_pagination(post::Entity::find(), 2, 10)
            .unwrap()
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LIMIT 10"), "{sql}");
        assert!(sql.contains("OFFSET 10"), "{sql}");
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(20, 10), 2);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn test_content_range_normal() {
        let headers = calculate_content_range(0, 10, 100, "articles");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "articles 0-9/100");
    }

    #[test]
    fn test_content_range_last_page_is_clamped() {
        let headers = calculate_content_range(20, 10, 25, "articles");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "articles 20-24/25");
    }

    #[test]
    fn test_content_range_empty_listing() {
        let headers = calculate_content_range(0, 10, 0, "articles");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert_eq!(value, "articles 0-0/0");
    }

    #[test]
    fn test_content_range_strips_control_characters() {
        let headers = calculate_content_range(0, 10, 100, "articles\r\nInjected: evil");
        let value = headers.get("Content-Range").unwrap().to_str().unwrap();
        assert!(!value.contains('\r') && !value.contains('\n'));
        assert!(value.starts_with("articlesInjected: evil"));
    }
}
