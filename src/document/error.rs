use thiserror::Error;
use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("Invalid range {range:?} for a document with {line_count} lines")]
    InvalidRange { range: Range, line_count: usize },

    #[error("Invalid position {position:?} for a document with {line_count} lines")]
    InvalidPosition { position: Position, line_count: usize },
}
