//! Versioned text buffer for one open editor file

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent, Url};

use crate::document::error::DocumentError;
use crate::document::position::{end_position, position_to_char};

/// Server-side copy of an open document
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    /// Advisory only, never consulted by the server
    language_id: String,
    /// Starts at 0 on open and grows by one per accepted change
    version: i32,
    text: Rope,
}

impl Document {
    /// Creates a document at version 0
    pub fn new(uri: Url, text: &str, language_id: impl Into<String>) -> Self {
        Self {
            uri,
            language_id: language_id.into(),
            version: 0,
            text: Rope::from_str(text),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns the full text as an owned string
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    /// Returns the position just past the last character
    pub fn end_position(&self) -> Position {
        end_position(&self.text)
    }

    /// Resolves `position` to a char offset, failing if it lies outside the text
    pub fn offset_at(&self, position: Position) -> Result<usize, DocumentError> {
        position_to_char(&self.text, position).ok_or(DocumentError::InvalidPosition {
            position,
            line_count: self.line_count(),
        })
    }

    /// Applies one content change and bumps the version.
    ///
    /// A change without a range replaces the whole text. A ranged change is
    /// validated before anything is touched, so a rejected edit leaves both
    /// text and version as they were.
    pub fn apply_change(
        &mut self,
        change: &TextDocumentContentChangeEvent,
    ) -> Result<(), DocumentError> {
        match change.range {
            None => {
                self.text = Rope::from_str(&change.text);
            }
            Some(range) => {
                let (start, end) = self.char_range(range)?;
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            }
        }

        self.version += 1;
        Ok(())
    }

    fn char_range(&self, range: Range) -> Result<(usize, usize), DocumentError> {
        let invalid = || DocumentError::InvalidRange {
            range,
            line_count: self.line_count(),
        };

        let start = position_to_char(&self.text, range.start).ok_or_else(invalid)?;
        let end = position_to_char(&self.text, range.end).ok_or_else(invalid)?;
        if start > end {
            return Err(invalid());
        }

        Ok((start, end))
    }
}
