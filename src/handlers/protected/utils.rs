use crate::error::ApiError;

/// Parse a positive numeric record id from a path segment.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation_error(format!("Invalid {} id '{}'", what, raw), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_integers_only() {
        assert_eq!(parse_id("42", "alumni").unwrap(), 42);
        for raw in ["0", "-1", "abc", "1.5", ""] {
            assert!(parse_id(raw, "alumni").is_err(), "{}", raw);
        }
    }
}
