// LSP protocol layer
// - server.rs: stdio/TCP entry points and the per-connection serve loop
// - codec.rs: Content-Length framing
// - inbox.rs: pending message queue, request cancellation
// - dispatcher.rs: dispatch table and lifecycle state machine
// - backend.rs: request/notification handlers
// - error.rs: dispatch errors and their JSON-RPC mapping
pub mod backend;
pub mod codec;
pub mod dispatcher;
pub mod error;
pub mod inbox;
pub mod server;
