pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl Default for LimitOffset {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl LimitOffset {
    /// Clamp caller supplied values into a range the database accepts.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset: offset.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(LimitOffset::new(0, -3), LimitOffset { limit: 1, offset: 0 });
        assert_eq!(
            LimitOffset::new(10_000, 20),
            LimitOffset {
                limit: MAX_LIMIT,
                offset: 20
            }
        );
    }

    #[test]
    fn default_is_first_page() {
        let page = LimitOffset::default();
        assert_eq!(page.limit, DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }
}
