//! Error types for sketchpad operations.

use crate::graphic::ShapeId;
use thiserror::Error;

/// Errors raised by container operations.
///
/// These are integration errors (bad draw type, malformed payload), not
/// interaction outcomes: a degenerate shape or an empty group filter is a
/// silent no-op and never produces one of these.
#[derive(Debug, Error)]
pub enum SketchError {
    #[error("Unsupported draw type: {0}")]
    InvalidDrawType(String),
    #[error("Unsupported static graphic type: {0}")]
    InvalidMarkerType(String),
    #[error("Invalid color {input:?}: {source}")]
    InvalidColor {
        input: String,
        #[source]
        source: peniko::color::ParseError,
    },
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for sketchpad operations.
pub type SketchResult<T> = Result<T, SketchError>;
