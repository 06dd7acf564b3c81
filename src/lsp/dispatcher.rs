//! Method routing and the server lifecycle.
//!
//! The dispatch table is built once per dispatcher. Handlers are plain
//! functions on [`Backend`]; params are decoded and results encoded here so
//! that handlers stay typed.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_lsp::jsonrpc::{Id, Request, Response};
use tracing::{debug, warn};

use crate::lsp::backend::Backend;
use crate::lsp::error::LspError;

/// Method names the standard table serves
pub mod method {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const SHUTDOWN: &str = "shutdown";
    pub const EXIT: &str = "exit";
    pub const DID_OPEN: &str = "textDocument/didOpen";
    pub const DID_CHANGE: &str = "textDocument/didChange";
    pub const DID_CLOSE: &str = "textDocument/didClose";
    pub const COMPLETION: &str = "textDocument/completion";
    pub const CANCEL_REQUEST: &str = "$/cancelRequest";
}

use method::*;

type RequestFn = Box<dyn Fn(&mut Backend, Option<Value>) -> Result<Value, LspError> + Send + Sync>;
type NotificationFn = Box<dyn Fn(&mut Backend, Option<Value>) -> Result<(), LspError> + Send + Sync>;

pub enum Handler {
    Request(RequestFn),
    Notification(NotificationFn),
}

impl Handler {
    pub fn is_request(&self) -> bool {
        matches!(self, Handler::Request(_))
    }
}

/// Ordered map from method name to handler
#[derive(Default)]
pub struct DispatchTable {
    handlers: IndexMap<&'static str, Handler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table every connection is served with
    pub fn standard() -> Self {
        Self::new()
            .request(INITIALIZE, Backend::initialize)
            .notification(INITIALIZED, Backend::initialized)
            .request(SHUTDOWN, Backend::shutdown)
            .notification(EXIT, Backend::exit)
            .notification(DID_OPEN, Backend::did_open)
            .notification(DID_CHANGE, Backend::did_change)
            .notification(DID_CLOSE, Backend::did_close)
            .request(COMPLETION, Backend::completion)
            .notification(CANCEL_REQUEST, Backend::cancel_request)
    }

    pub fn request<P, R>(
        mut self,
        method: &'static str,
        handler: fn(&mut Backend, P) -> Result<R, LspError>,
    ) -> Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
    {
        let handler: RequestFn = Box::new(move |backend, params| {
            let result = handler(backend, parse_params(params)?)?;
            serde_json::to_value(result).map_err(LspError::Serialize)
        });
        self.handlers.insert(method, Handler::Request(handler));
        self
    }

    pub fn notification<P>(
        mut self,
        method: &'static str,
        handler: fn(&mut Backend, P) -> Result<(), LspError>,
    ) -> Self
    where
        P: DeserializeOwned + 'static,
    {
        let handler: NotificationFn =
            Box::new(move |backend, params| handler(backend, parse_params(params)?));
        self.handlers.insert(method, Handler::Notification(handler));
        self
    }

    pub fn get(&self, method: &str) -> Option<&Handler> {
        self.handlers.get(method)
    }

    /// Registered methods, in registration order
    pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

fn parse_params<P: DeserializeOwned>(params: Option<Value>) -> Result<P, LspError> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(LspError::InvalidParams)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    ShuttingDown,
    Stopped,
}

/// How the client ended the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// `shutdown` was answered before `exit`
    Clean,
    Abnormal,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Abnormal => 1,
        }
    }
}

/// Routes messages of one connection to its backend.
///
/// Messages must be fed in arrival order; each call completes before the next
/// one starts, which is what keeps the workspace consistent without locks.
pub struct Dispatcher {
    table: DispatchTable,
    backend: Backend,
    phase: Phase,
    shutdown_requested: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_backend(Backend::new())
    }

    pub fn with_backend(backend: Backend) -> Self {
        Self {
            table: DispatchTable::standard(),
            backend,
            phase: Phase::Uninitialized,
            shutdown_requested: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.is_stopped() && self.shutdown_requested {
            ExitStatus::Clean
        } else {
            ExitStatus::Abnormal
        }
    }

    /// Server-to-client notifications produced by the messages dispatched so far
    pub fn take_outgoing(&mut self) -> Vec<Request> {
        self.backend.take_outgoing()
    }

    /// Handles one message. Requests always produce a response, notifications never do.
    pub fn dispatch(&mut self, request: Request) -> Option<Response> {
        let (method, id, params) = request.into_parts();

        match id {
            Some(id) => Some(self.handle_request(&method, id, params)),
            None => {
                self.handle_notification(&method, params);
                None
            }
        }
    }

    fn handle_request(&mut self, method: &str, id: Id, params: Option<Value>) -> Response {
        debug!("Request {} ({:?})", method, id);

        match self.run_request(method, params) {
            Ok(result) => Response::from_ok(id, result),
            Err(err) => {
                warn!("Request {} ({:?}) failed: {}", method, id, err);
                Response::from_error(id, err.into())
            }
        }
    }

    fn run_request(&mut self, method: &str, params: Option<Value>) -> Result<Value, LspError> {
        match self.phase {
            Phase::Uninitialized if method != INITIALIZE => return Err(LspError::NotInitialized),
            Phase::ShuttingDown | Phase::Stopped => return Err(LspError::ShuttingDown),
            _ => {}
        }

        let handler = match self.table.get(method) {
            Some(Handler::Request(handler)) => handler,
            Some(Handler::Notification(_)) => {
                return Err(LspError::NotARequest(method.to_string()));
            }
            None => return Err(LspError::MethodNotFound(method.to_string())),
        };
        let result = handler(&mut self.backend, params)?;

        match method {
            INITIALIZE => self.phase = Phase::Initialized,
            SHUTDOWN => {
                self.phase = Phase::ShuttingDown;
                self.shutdown_requested = true;
            }
            _ => {}
        }

        Ok(result)
    }

    fn handle_notification(&mut self, method: &str, params: Option<Value>) {
        let admitted = match self.phase {
            Phase::Stopped => false,
            _ if method == EXIT => true,
            Phase::Initialized => true,
            Phase::Uninitialized | Phase::ShuttingDown => false,
        };
        if !admitted {
            debug!("Dropping {} notification while {:?}", method, self.phase);
            return;
        }

        let handler = match self.table.get(method) {
            Some(Handler::Notification(handler)) => handler,
            Some(Handler::Request(_)) => {
                warn!("Dropping {} sent without an id", method);
                return;
            }
            None => {
                if !method.starts_with("$/") {
                    debug!("Unhandled notification {}", method);
                }
                return;
            }
        };

        if let Err(err) = handler(&mut self.backend, params) {
            self.backend.report_failure(method, &err);
        }

        if method == EXIT {
            self.phase = Phase::Stopped;
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
