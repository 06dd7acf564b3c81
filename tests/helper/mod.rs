#![allow(dead_code)]

use std::time::Duration;

use echo_lsp::lsp::codec::CodecError;
use echo_lsp::lsp::dispatcher::ExitStatus;
use echo_lsp::lsp::server::serve;
use serde_json::{Value, json};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const URI: &str = "file:///test/main.py";

const PIPE_CAPACITY: usize = 64 * 1024;
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Client end of an in-memory connection to a running server
pub struct TestClient {
    writer: Option<DuplexStream>,
    reader: BufReader<DuplexStream>,
    server: JoinHandle<Result<ExitStatus, CodecError>>,
    /// Server notifications seen while waiting for responses
    pub notifications: Vec<Value>,
}

impl TestClient {
    pub fn start() -> Self {
        let (client_out, server_in) = tokio::io::duplex(PIPE_CAPACITY);
        let (server_out, client_in) = tokio::io::duplex(PIPE_CAPACITY);

        let server = tokio::spawn(serve(server_in, server_out));

        Self {
            writer: Some(client_out),
            reader: BufReader::new(client_in),
            server,
            notifications: Vec::new(),
        }
    }

    /// Starts a server and completes the initialize handshake
    pub async fn initialized() -> Self {
        let mut client = Self::start();
        client.send(&initialize_request(1)).await;
        let response = client.response(1).await;
        assert!(response.get("error").is_none(), "initialize failed: {response}");
        client.send(&initialized_notification()).await;
        client
    }

    pub async fn send(&mut self, message: &Value) {
        self.send_raw(frame(message).as_bytes()).await;
    }

    /// Writes several messages with a single write
    pub async fn send_batch(&mut self, messages: &[Value]) {
        let raw: String = messages.iter().map(frame).collect();
        self.send_raw(raw.as_bytes()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let writer = self.writer.as_mut().expect("client input already closed");
        writer.write_all(bytes).await.unwrap();
        writer.flush().await.unwrap();
    }

    /// Next message from the server, or `None` once the server closed its side
    pub async fn recv(&mut self) -> Option<Value> {
        timeout(RECV_TIMEOUT, read_frame(&mut self.reader))
            .await
            .expect("Timed out waiting for a server message")
    }

    /// Waits for the response with `id`, collecting notifications on the way
    pub async fn response(&mut self, id: i64) -> Value {
        loop {
            let message = self
                .recv()
                .await
                .unwrap_or_else(|| panic!("Server closed before responding to {id}"));
            if message.get("method").is_some() {
                self.notifications.push(message);
                continue;
            }
            if message["id"] == id {
                return message;
            }
            panic!("Unexpected response while waiting for {id}: {message}");
        }
    }

    pub async fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send(&request(id, method, params)).await;
        self.response(id).await
    }

    pub async fn complete(&mut self, id: i64, uri: &str, line: u32, character: u32) -> Value {
        self.send(&completion_request(id, uri, line, character)).await;
        self.response(id).await
    }

    /// Closes the client's output and waits for the server to finish
    pub async fn finish(mut self) -> Result<ExitStatus, CodecError> {
        self.writer.take();
        timeout(RECV_TIMEOUT, self.server)
            .await
            .expect("Timed out waiting for the server to stop")
            .expect("Server task panicked")
    }

    /// Waits for the server to finish without closing the client's output
    pub async fn join(self) -> Result<ExitStatus, CodecError> {
        timeout(RECV_TIMEOUT, self.server)
            .await
            .expect("Timed out waiting for the server to stop")
            .expect("Server task panicked")
    }
}

pub fn frame(message: &Value) -> String {
    let body = message.to_string();
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
}

pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Value> {
    let mut length = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.unwrap() == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length: ") {
            length = Some(value.parse::<usize>().unwrap());
        }
    }

    let mut body = vec![0u8; length.expect("Missing Content-Length")];
    reader.read_exact(&mut body).await.unwrap();
    Some(serde_json::from_slice(&body).unwrap())
}

pub fn request(id: i64, method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
}

pub fn notification(method: &str, params: Value) -> Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params })
}

pub fn initialize_request(id: i64) -> Value {
    request(id, "initialize", json!({ "rootUri": "file:///test" }))
}

pub fn initialized_notification() -> Value {
    notification("initialized", json!({}))
}

pub fn did_open_notification(uri: &str, text: &str) -> Value {
    notification(
        "textDocument/didOpen",
        json!({
            "textDocument": { "uri": uri, "languageId": "python", "version": 0, "text": text }
        }),
    )
}

/// Incremental change on a single line range
pub fn edit(start: (u32, u32), end: (u32, u32), text: &str) -> Value {
    json!({
        "range": {
            "start": { "line": start.0, "character": start.1 },
            "end": { "line": end.0, "character": end.1 }
        },
        "text": text
    })
}

pub fn replace_all(text: &str) -> Value {
    json!({ "text": text })
}

pub fn did_change_notification(uri: &str, version: i32, changes: Vec<Value>) -> Value {
    notification(
        "textDocument/didChange",
        json!({
            "textDocument": { "uri": uri, "version": version },
            "contentChanges": changes
        }),
    )
}

pub fn did_close_notification(uri: &str) -> Value {
    notification(
        "textDocument/didClose",
        json!({ "textDocument": { "uri": uri } }),
    )
}

pub fn completion_request(id: i64, uri: &str, line: u32, character: u32) -> Value {
    request(
        id,
        "textDocument/completion",
        json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        }),
    )
}

pub fn shutdown_request(id: i64) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "method": "shutdown" })
}

pub fn exit_notification() -> Value {
    json!({ "jsonrpc": "2.0", "method": "exit" })
}

pub fn labels(response: &Value) -> Vec<String> {
    response["result"]
        .as_array()
        .expect("completion result should be an array")
        .iter()
        .map(|item| item["label"].as_str().unwrap().to_string())
        .collect()
}

pub const KEYWORDS: [&str; 5] = ["if", "for", "while", "def", "class"];
