use thiserror::Error;

/// Errors raised by the search engine.
///
/// Every variant is a programming-contract violation: the engine has no I/O,
/// so nothing here is worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Search was started from a node that has a parent.
    #[error("search root must not have a parent")]
    InvalidRoot,

    /// Expansion was requested for an action that is not untried.
    #[error("action {0} is not untried at this node")]
    InvalidAction(String),

    /// The tie-break utility got no candidates to choose from.
    #[error("cannot select from an empty candidate set")]
    EmptyCandidateSet,
}

/// Convenience Result type for search operations
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SearchError::InvalidRoot.to_string(),
            "search root must not have a parent"
        );
        assert_eq!(
            SearchError::InvalidAction("Left".to_string()).to_string(),
            "action Left is not untried at this node"
        );
        assert_eq!(
            SearchError::EmptyCandidateSet.to_string(),
            "cannot select from an empty candidate set"
        );
    }
}
