//! Trait for producing completion candidates from a document

use tower_lsp::lsp_types::{CompletionItem, Position};

use crate::document::{Document, DocumentError};

/// Produces completion candidates for a cursor position.
///
/// Implementations must be deterministic: the same document version and
/// position always yield the same candidates in the same order.
pub trait CompletionProvider: Send {
    /// Returns the candidates for `position` in `document`
    ///
    /// # Returns
    /// * `Ok(Vec<CompletionItem>)` - Candidates in display order
    /// * `Err(DocumentError::InvalidPosition)` - If `position` lies outside the document
    fn complete(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Vec<CompletionItem>, DocumentError>;
}
