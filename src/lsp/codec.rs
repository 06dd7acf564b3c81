//! `Content-Length` framing for JSON-RPC messages

use serde::Serialize;
use serde_json::error::Category;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tower_lsp::jsonrpc::{Error as RpcError, ErrorCode, Id, Request, Response};
use tracing::trace;

/// Largest body accepted in a single frame
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Framing or decoding failure. Always fatal to the connection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of input inside a message")]
    UnexpectedEof,

    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Malformed JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Not a JSON-RPC request or notification: {0}")]
    InvalidMessage(#[source] serde_json::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CodecError {
    /// Error response (with a null id) to send before closing, if the peer can still read
    pub fn to_response(&self) -> Option<Response> {
        let code = match self {
            CodecError::Parse(_) | CodecError::MissingContentLength | CodecError::InvalidHeader(_) => {
                ErrorCode::ParseError
            }
            CodecError::InvalidMessage(_) => ErrorCode::InvalidRequest,
            CodecError::Io(_) | CodecError::UnexpectedEof | CodecError::Encode(_) => return None,
        };

        Some(Response::from_error(
            Id::Null,
            RpcError {
                code,
                message: self.to_string().into(),
                data: None,
            },
        ))
    }
}

/// Reads one framed message.
///
/// Returns `Ok(None)` on a clean end of input between messages.
pub async fn read_message<R>(input: &mut R) -> Result<Option<Request>, CodecError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut seen_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return if seen_header {
                Err(CodecError::UnexpectedEof)
            } else {
                Ok(None)
            };
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if seen_header {
                break;
            }
            // stray separator between messages
            continue;
        }
        seen_header = true;

        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| CodecError::InvalidHeader(header.to_string()))?;

        // Content-Type and unknown headers are ignored
        if name.trim().eq_ignore_ascii_case("content-length") {
            let length = value
                .trim()
                .parse::<usize>()
                .map_err(|_| CodecError::InvalidHeader(header.to_string()))?;
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or(CodecError::MissingContentLength)?;
    if length > MAX_CONTENT_LENGTH {
        return Err(CodecError::InvalidHeader(format!(
            "Content-Length {length} exceeds the {MAX_CONTENT_LENGTH} byte limit"
        )));
    }

    // The buffer grows with the bytes actually received
    let mut body = Vec::new();
    (&mut *input).take(length as u64).read_to_end(&mut body).await?;
    if body.len() < length {
        return Err(CodecError::UnexpectedEof);
    }

    trace!("<- {}", String::from_utf8_lossy(&body));
    decode(&body).map(Some)
}

fn decode(body: &[u8]) -> Result<Request, CodecError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => CodecError::InvalidMessage(e),
        _ => CodecError::Parse(e),
    })
}

/// Writes one framed message and flushes
pub async fn write_message<W, T>(output: &mut W, message: &T) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(message).map_err(CodecError::Encode)?;
    trace!("-> {}", String::from_utf8_lossy(&body));

    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    output.write_all(header.as_bytes()).await?;
    output.write_all(&body).await?;
    output.flush().await?;
    Ok(())
}
