use thiserror::Error;

/// Errors that can occur when loading or processing alert model inputs.
///
/// A measurement that satisfies no configured threshold is *not* an error:
/// it classifies to [`crate::severity::AlertLevel::Unknown`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required column is missing from an input source. Fatal for that
    /// source: the whole load is aborted.
    #[error("missing required columns: {0}")]
    Schema(String),

    /// One row of an input source could not be parsed. Row numbers are
    /// 1-based over data rows (the header is not counted).
    #[error("row {row}: {reason}")]
    Record { row: usize, reason: String },

    /// An operation was invoked on an inconsistent state, e.g. assigning
    /// towns before any ROI is loaded.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}
