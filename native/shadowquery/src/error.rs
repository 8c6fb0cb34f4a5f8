use thiserror::Error;

/// Errors raised while splitting or evaluating a selector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Unbalanced grouping, unterminated string or dangling escape
    #[error("malformed selector {predicate:?} at byte {position}: {reason}")]
    MalformedPredicate {
        predicate: String,
        position: usize,
        reason: &'static str,
    },

    /// Rejected by the selector matcher
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

impl QueryError {
    pub fn malformed(predicate: &str, position: usize, reason: &'static str) -> Self {
        QueryError::MalformedPredicate {
            predicate: predicate.to_string(),
            position,
            reason,
        }
    }

    pub fn invalid(selector: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = QueryError::malformed("div[a", 3, "unclosed '['");
        assert_eq!(err.to_string(), "malformed selector \"div[a\" at byte 3: unclosed '['");

        let err = QueryError::invalid("::before", "pseudo-elements are not supported");
        assert_eq!(
            err.to_string(),
            "invalid selector \"::before\": pseudo-elements are not supported"
        );
    }
}
