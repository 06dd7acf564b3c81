//! Keyword completion provider

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Position};

use crate::completion::provider::CompletionProvider;
use crate::document::{Document, DocumentError};

/// Keywords offered when no other list is configured
pub const DEFAULT_KEYWORDS: [&str; 5] = ["if", "for", "while", "def", "class"];

/// Offers a fixed keyword list regardless of the surrounding text
#[derive(Debug, Clone)]
pub struct KeywordCompletionProvider {
    items: Vec<CompletionItem>,
}

impl KeywordCompletionProvider {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = keywords
            .into_iter()
            .map(|keyword| CompletionItem {
                label: keyword.into(),
                kind: Some(CompletionItemKind::KEYWORD),
                ..Default::default()
            })
            .collect();

        Self { items }
    }
}

impl Default for KeywordCompletionProvider {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl CompletionProvider for KeywordCompletionProvider {
    fn complete(
        &self,
        document: &Document,
        position: Position,
    ) -> Result<Vec<CompletionItem>, DocumentError> {
        document.offset_at(position)?;
        Ok(self.items.clone())
    }
}
