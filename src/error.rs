//! Errors raised when building an evaluation context.
use thiserror::Error;

/// Precondition violations on the `(labels, scores)` pair handed to the
/// evaluation engine. Degenerate inputs (empty sets, zero denominators) are
/// not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("labels and scores must be index-aligned: got {labels} labels and {scores} scores")]
    LengthMismatch { labels: usize, scores: usize },
    #[error("label at index {index} is {value}, expected 0 or 1")]
    InvalidLabel { index: usize, value: u8 },
}
