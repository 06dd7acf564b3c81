use std::borrow::Cow;

use serde_json::json;
use thiserror::Error;
use tower_lsp::jsonrpc::{Error as RpcError, ErrorCode};

use crate::document::DocumentError;
use crate::workspace::WorkspaceError;

/// LSP-reserved code for requests received before `initialize`
pub const SERVER_NOT_INITIALIZED: i64 = -32002;

/// Coarse class of a dispatch failure, reported as `data.kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong lifecycle phase or workspace state
    State,
    /// Unknown document
    NotFound,
    /// Bad params, range or position
    Validation,
    /// Method the server does not serve
    Unsupported,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::State => "state",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Failure while routing or handling one message
#[derive(Debug, Error)]
pub enum LspError {
    #[error("Server is not initialized")]
    NotInitialized,

    #[error("Server is shutting down")]
    ShuttingDown,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0} is a notification and cannot be sent as a request")]
    NotARequest(String),

    #[error("Invalid params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Failed to serialize result: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl LspError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LspError::NotInitialized | LspError::ShuttingDown => ErrorKind::State,
            LspError::Workspace(WorkspaceError::UnknownDocument(_)) => ErrorKind::NotFound,
            LspError::Workspace(_) => ErrorKind::State,
            LspError::InvalidParams(_) | LspError::Document(_) => ErrorKind::Validation,
            LspError::MethodNotFound(_) | LspError::NotARequest(_) => ErrorKind::Unsupported,
            LspError::Cancelled => ErrorKind::Cancelled,
            LspError::Serialize(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LspError::NotInitialized => ErrorCode::ServerError(SERVER_NOT_INITIALIZED),
            LspError::Cancelled => ErrorCode::RequestCancelled,
            LspError::MethodNotFound(_) => ErrorCode::MethodNotFound,
            LspError::ShuttingDown | LspError::NotARequest(_) => ErrorCode::InvalidRequest,
            LspError::Workspace(WorkspaceError::UnknownDocument(_)) => ErrorCode::InvalidParams,
            LspError::Workspace(_) => ErrorCode::InvalidRequest,
            LspError::InvalidParams(_) | LspError::Document(_) => ErrorCode::InvalidParams,
            LspError::Serialize(_) => ErrorCode::InternalError,
        }
    }
}

impl From<LspError> for RpcError {
    fn from(err: LspError) -> Self {
        RpcError {
            code: err.code(),
            message: Cow::Owned(err.to_string()),
            data: Some(json!({ "kind": err.kind().as_str() })),
        }
    }
}
