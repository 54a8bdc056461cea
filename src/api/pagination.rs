use serde::Serialize;

/// Hard ceiling for any listing endpoint; question banks are the largest
/// collection and stay well under this.
pub(crate) const MAX_PAGE_SIZE: i64 = 500;

pub(crate) const fn default_limit() -> i64 {
    50
}

/// Normalizes client paging input: negative offsets become zero, the page
/// size lands in 1..=MAX_PAGE_SIZE. The response echoes the effective values.
pub(crate) fn clamp_page(skip: i64, limit: i64) -> (i64, i64) {
    (skip.max(0), limit.clamp(1, MAX_PAGE_SIZE))
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_page_bounds_input() {
        assert_eq!(clamp_page(-5, 0), (0, 1));
        assert_eq!(clamp_page(10, 50), (10, 50));
        assert_eq!(clamp_page(0, 100_000), (0, MAX_PAGE_SIZE));
    }
}
