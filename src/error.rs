use thiserror::Error;

/// Failure kinds surfaced by board mutations and value constructors.
///
/// Every failing operation leaves the board exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    /// Malformed input to a value constructor (name, type tag, coordinate).
    #[error("validation failed: {0}")]
    Validation(String),
    /// The operation would overlap another card or duplicate an identity.
    #[error("conflict: {0}")]
    Conflict(String),
    /// A referenced card, aggregate or connection does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The resulting position leaves the board extent.
    #[error("position ({x}, {y}) is outside the board extent")]
    OutOfBounds { x: f32, y: f32 },
}

pub type BoardResult<T> = Result<T, BoardError>;
