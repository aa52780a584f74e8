//! Path and query-string parsing shared by the resource handlers.

use courier_db::AuthScope;
use courier_types::api::{Claims, ListQuery};
use courier_types::filters::Filters;

use crate::error::ApiError;

/// Path ids arrive as text and must be positive integers.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_field(field, "must be a positive integer")),
    }
}

/// Scope for a `/users/{user_id}/...` route. Another user's id is reported
/// as `NotFound`, exactly like a row outside the caller's scope.
pub fn caller_scope(claims: &Claims, raw_user_id: &str) -> Result<AuthScope, ApiError> {
    let user_id = parse_id("user_id", raw_user_id)?;
    if user_id != claims.sub {
        return Err(ApiError::NotFound);
    }
    Ok(AuthScope::new(claims.sub))
}

pub fn list_filters(
    query: &ListQuery,
    default_sort: &str,
    safelist: &'static [&'static str],
) -> Result<Filters, ApiError> {
    let sort = query.sort.as_deref().filter(|s| !s.trim().is_empty());
    Ok(Filters::parse(
        query.page.as_deref(),
        query.page_size.as_deref(),
        sort,
        default_sort,
        safelist,
    )?)
}
