use serde::Deserialize;
use serde_json::{Value, json};
use tower_lsp::jsonrpc::Request;
use tower_lsp::lsp_types::{
    CancelParams, CompletionItem, CompletionOptions, CompletionParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    InitializeResult, MessageType, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions, Url,
};
use tracing::{debug, info, warn};

use crate::completion::{CompletionProvider, KeywordCompletionProvider};
use crate::config::SERVER_NAME;
use crate::lsp::error::LspError;
use crate::workspace::Workspace;

const LOG_MESSAGE: &str = "window/logMessage";

/// The `initialize` params this server reads; everything else is ignored
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub root_uri: Option<Url>,
    #[serde(default)]
    pub initialization_options: Option<Value>,
}

/// Per-connection server state and the handlers the dispatch table routes to
pub struct Backend {
    workspace: Workspace,
    completion: Box<dyn CompletionProvider>,
    /// Server-to-client notifications waiting to be written
    outgoing: Vec<Request>,
}

impl Backend {
    pub fn new() -> Self {
        Self::with_provider(Box::new(KeywordCompletionProvider::default()))
    }

    pub fn with_provider(completion: Box<dyn CompletionProvider>) -> Self {
        Self {
            workspace: Workspace::new(),
            completion,
            outgoing: Vec::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn server_capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::INCREMENTAL),
                    ..Default::default()
                },
            )),
            completion_provider: Some(CompletionOptions::default()),
            ..Default::default()
        }
    }

    /// Drains queued server-to-client notifications
    pub fn take_outgoing(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.outgoing)
    }

    pub(crate) fn log_message(&mut self, typ: MessageType, message: impl Into<String>) {
        let params = json!({ "type": typ, "message": message.into() });
        self.outgoing
            .push(Request::build(LOG_MESSAGE).params(params).finish());
    }

    /// Reports a notification that failed; there is no response to carry it
    pub(crate) fn report_failure(&mut self, method: &str, err: &LspError) {
        warn!("Notification {} failed: {}", method, err);
        self.log_message(MessageType::WARNING, format!("{} failed: {}", method, err));
    }

    pub fn initialize(&mut self, params: InitializeParams) -> Result<InitializeResult, LspError> {
        self.workspace.initialize(params.root_uri)?;

        if let Some(options) = &params.initialization_options {
            debug!("Initialization options: {}", options);
        }
        info!("Workspace initialized");
        self.log_message(MessageType::INFO, "LSP server initializing");

        Ok(InitializeResult {
            capabilities: Self::server_capabilities(),
            server_info: Some(ServerInfo {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    pub fn initialized(&mut self, _params: Value) -> Result<(), LspError> {
        info!("Client acknowledged initialization");
        self.log_message(MessageType::INFO, "LSP server initialized");
        Ok(())
    }

    pub fn shutdown(&mut self, _params: ()) -> Result<(), LspError> {
        info!(
            "Shutdown requested with {} open documents",
            self.workspace.len()
        );
        self.log_message(MessageType::INFO, "LSP server shutting down");
        Ok(())
    }

    pub fn exit(&mut self, _params: Value) -> Result<(), LspError> {
        info!("Exit received");
        Ok(())
    }

    pub fn did_open(&mut self, params: DidOpenTextDocumentParams) -> Result<(), LspError> {
        let item = params.text_document;
        if item.version != 0 {
            debug!(
                "Client opened {} at version {}, tracking from 0",
                item.uri, item.version
            );
        }

        let message = format!("Document opened: {}", item.uri);
        self.workspace
            .open_document(item.uri, &item.text, item.language_id)?;

        debug!("{}", message);
        self.log_message(MessageType::LOG, message);
        Ok(())
    }

    /// Applies the content changes in order. A failing change stops the batch;
    /// the changes before it stay applied.
    pub fn did_change(&mut self, params: DidChangeTextDocumentParams) -> Result<(), LspError> {
        let uri = params.text_document.uri;
        let document = self.workspace.document_mut(&uri)?;

        for change in &params.content_changes {
            document.apply_change(change)?;
        }

        if document.version() != params.text_document.version {
            debug!(
                "Client reports version {} for {}, server is at {}",
                params.text_document.version,
                uri,
                document.version()
            );
        }
        debug!(
            "Applied {} changes to {}",
            params.content_changes.len(),
            uri
        );
        Ok(())
    }

    pub fn did_close(&mut self, params: DidCloseTextDocumentParams) -> Result<(), LspError> {
        let document = self
            .workspace
            .close_document(&params.text_document.uri)?;

        debug!(
            "Document closed: {} (version {})",
            document.uri(),
            document.version()
        );
        Ok(())
    }

    pub fn completion(&mut self, params: CompletionParams) -> Result<Vec<CompletionItem>, LspError> {
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;

        let document = self.workspace.document(&uri)?;
        let items = self.completion.complete(document, position)?;

        debug!(
            "Returning {} completion items for {} at {}:{}",
            items.len(),
            uri,
            position.line,
            position.character
        );
        Ok(items)
    }

    /// Cancellation is settled by the inbox before dispatch; by the time the
    /// notification itself is dispatched nothing is in flight.
    pub fn cancel_request(&mut self, params: CancelParams) -> Result<(), LspError> {
        debug!("Cancel for {:?}: nothing in flight", params.id);
        Ok(())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}
