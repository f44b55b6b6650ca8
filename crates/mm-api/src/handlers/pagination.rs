use mm_common::api::page::{PageQuery, MAX_LIMIT};

use crate::error::ApiError;

pub fn validate_page(query: PageQuery) -> Result<PageQuery, ApiError> {
    if query.page == 0 {
        return Err(ApiError::BadRequest("page must be at least 1".into()));
    }

    if !(1..=MAX_LIMIT).contains(&query.limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_defaults() {
        assert!(validate_page(PageQuery::default()).is_ok());
    }

    #[test]
    fn rejects_zero_page_and_oversized_limit() {
        assert!(validate_page(PageQuery { page: 0, limit: 10 }).is_err());
        assert!(validate_page(PageQuery { page: 1, limit: MAX_LIMIT + 1 }).is_err());
        assert!(validate_page(PageQuery { page: 1, limit: 0 }).is_err());
    }
}
