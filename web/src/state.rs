//! Application state for Axum handlers.

use data_citation_runtime::CitationProcessor;

/// State shared across all HTTP handlers.
///
/// Cheap to clone: the processor is reference counted internally.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The citation request processor (owns the access gate).
    pub processor: CitationProcessor,
}

impl AppState {
    /// Create the application state.
    #[must_use]
    pub const fn new(processor: CitationProcessor) -> Self {
        Self { processor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }
}
