//! Queue of decoded messages awaiting dispatch.
//!
//! A `$/cancelRequest` can only take effect while its target is still queued
//! here; once the dispatcher has answered a request, cancelling it is a no-op.

use std::collections::{HashSet, VecDeque};

use tower_lsp::jsonrpc::{Id, Request};
use tower_lsp::lsp_types::{CancelParams, NumberOrString};
use tracing::debug;

use crate::lsp::dispatcher::method::CANCEL_REQUEST;

/// Next unit of work for the serve loop
#[derive(Debug)]
pub enum Inbound {
    /// Dispatch this message
    Message(Request),
    /// Answer this request id as cancelled without running it
    Cancelled(Id),
}

#[derive(Debug, Default)]
pub struct Inbox {
    queue: VecDeque<Request>,
    cancelled: HashSet<Id>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message, applying it first if it cancels a queued request.
    ///
    /// The cancel notification itself stays in the queue so the dispatcher
    /// sees it in order.
    pub fn push(&mut self, request: Request) {
        if request.method() == CANCEL_REQUEST {
            if let Some(id) = cancel_target(&request) {
                if self.queue.iter().any(|queued| queued.id() == Some(&id)) {
                    debug!("Cancelling queued request {:?}", id);
                    self.cancelled.insert(id);
                } else {
                    debug!("Cancel for {:?} ignored: not queued", id);
                }
            }
        }

        self.queue.push_back(request);
    }

    pub fn pop(&mut self) -> Option<Inbound> {
        let request = self.queue.pop_front()?;

        if let Some(id) = request.id() {
            if self.cancelled.remove(id) {
                return Some(Inbound::Cancelled(id.clone()));
            }
        }

        Some(Inbound::Message(request))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

fn cancel_target(request: &Request) -> Option<Id> {
    let params: CancelParams = serde_json::from_value(request.params()?.clone()).ok()?;

    Some(match params.id {
        NumberOrString::Number(n) => Id::Number(n.into()),
        NumberOrString::String(s) => Id::String(s),
    })
}
