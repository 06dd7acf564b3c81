//! Set of open documents plus the project root

use std::collections::HashMap;

use thiserror::Error;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::document::Document;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("Workspace is already initialized")]
    AlreadyInitialized,

    #[error("Document is already open: {0}")]
    DuplicateDocument(Url),

    #[error("Document is not open: {0}")]
    UnknownDocument(Url),
}

/// Owns every open document of one connection
#[derive(Debug, Default)]
pub struct Workspace {
    root_uri: Option<Url>,
    initialized: bool,
    documents: HashMap<Url, Document>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the project root. Only the first call succeeds.
    pub fn initialize(&mut self, root_uri: Option<Url>) -> Result<(), WorkspaceError> {
        if self.initialized {
            return Err(WorkspaceError::AlreadyInitialized);
        }

        debug!("Workspace root: {:?}", root_uri.as_ref().map(Url::as_str));
        self.root_uri = root_uri;
        self.initialized = true;
        Ok(())
    }

    pub fn root_uri(&self) -> Option<&Url> {
        self.root_uri.as_ref()
    }

    /// Opens a document at version 0
    pub fn open_document(
        &mut self,
        uri: Url,
        text: &str,
        language_id: impl Into<String>,
    ) -> Result<&Document, WorkspaceError> {
        if self.documents.contains_key(&uri) {
            return Err(WorkspaceError::DuplicateDocument(uri));
        }

        let document = Document::new(uri.clone(), text, language_id);
        Ok(self.documents.entry(uri).or_insert(document))
    }

    pub fn document(&self, uri: &Url) -> Result<&Document, WorkspaceError> {
        self.documents
            .get(uri)
            .ok_or_else(|| WorkspaceError::UnknownDocument(uri.clone()))
    }

    pub fn document_mut(&mut self, uri: &Url) -> Result<&mut Document, WorkspaceError> {
        self.documents
            .get_mut(uri)
            .ok_or_else(|| WorkspaceError::UnknownDocument(uri.clone()))
    }

    /// Removes a document, handing it back to the caller
    pub fn close_document(&mut self, uri: &Url) -> Result<Document, WorkspaceError> {
        self.documents
            .remove(uri)
            .ok_or_else(|| WorkspaceError::UnknownDocument(uri.clone()))
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
