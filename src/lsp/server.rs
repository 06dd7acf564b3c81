use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_lsp::jsonrpc::{Request, Response};
use tracing::{debug, error, info, warn};

use crate::config::SERVER_NAME;
use crate::lsp::codec::{self, CodecError};
use crate::lsp::dispatcher::{Dispatcher, ExitStatus};
use crate::lsp::error::LspError;
use crate::lsp::inbox::{Inbound, Inbox};

type Frame = Result<Request, CodecError>;

/// Serves a single client on stdin/stdout
pub async fn run_stdio() -> anyhow::Result<ExitStatus> {
    info!("Starting {} server on stdio", SERVER_NAME);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let status = serve(stdin, stdout).await?;

    info!("{} server stopped ({:?})", SERVER_NAME, status);
    Ok(status)
}

/// Accepts TCP clients until interrupted. Every connection gets its own workspace.
pub async fn run_tcp(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting {} server on {}", SERVER_NAME, listener.local_addr()?);

    accept_until(listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for interrupt: {}", e);
        }
    })
    .await;

    info!("Interrupted, no longer accepting connections");
    Ok(())
}

/// Serves every accepted connection on its own task until `stop` resolves
pub async fn accept_until<F>(listener: TcpListener, stop: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => return,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                info!("Client connected: {}", peer);
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    match serve(reader, writer).await {
                        Ok(status) => info!("Client {} disconnected ({:?})", peer, status),
                        Err(e) => error!("Connection to {} failed: {}", peer, e),
                    }
                });
            }
        }
    }
}

/// Runs one connection to completion.
///
/// A protocol error closes the connection after a best-effort error response.
pub async fn serve<R, W>(input: R, output: W) -> Result<ExitStatus, CodecError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(read_frames(BufReader::new(input), tx));

    let result = Connection::new(rx, output).run().await;

    reader.abort();
    result
}

async fn read_frames<R>(mut input: R, frames: mpsc::UnboundedSender<Frame>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let frame = match codec::read_message(&mut input).await {
            Ok(Some(request)) => Ok(request),
            Ok(None) => {
                debug!("Input reached end of stream");
                return;
            }
            Err(e) => Err(e),
        };

        let fatal = frame.is_err();
        if frames.send(frame).is_err() || fatal {
            return;
        }
    }
}

struct Connection<W> {
    frames: mpsc::UnboundedReceiver<Frame>,
    output: W,
    dispatcher: Dispatcher,
    inbox: Inbox,
}

impl<W: AsyncWrite + Unpin> Connection<W> {
    fn new(frames: mpsc::UnboundedReceiver<Frame>, output: W) -> Self {
        Self {
            frames,
            output,
            dispatcher: Dispatcher::new(),
            inbox: Inbox::new(),
        }
    }

    async fn run(mut self) -> Result<ExitStatus, CodecError> {
        while let Some(frame) = self.frames.recv().await {
            let failure = self.enqueue(frame);

            if let Some(status) = self.process_inbox().await? {
                return Ok(status);
            }

            if let Some(err) = failure {
                error!("Protocol error, closing connection: {}", err);
                if let Some(response) = err.to_response() {
                    codec::write_message(&mut self.output, &response).await?;
                }
                return Err(err);
            }
        }

        warn!("Client closed the connection without exit");
        Ok(ExitStatus::Abnormal)
    }

    /// Queues `first` and every frame already received behind it, stopping at
    /// the first protocol error.
    fn enqueue(&mut self, first: Frame) -> Option<CodecError> {
        let mut next = Some(first);

        while let Some(frame) = next.take() {
            match frame {
                Ok(request) => self.inbox.push(request),
                Err(e) => return Some(e),
            }
            next = self.frames.try_recv().ok();
        }

        None
    }

    async fn process_inbox(&mut self) -> Result<Option<ExitStatus>, CodecError> {
        while let Some(inbound) = self.inbox.pop() {
            let response = match inbound {
                Inbound::Message(request) => self.dispatcher.dispatch(request),
                Inbound::Cancelled(id) => {
                    debug!("Request {:?} cancelled before dispatch", id);
                    Some(Response::from_error(id, LspError::Cancelled.into()))
                }
            };

            for notification in self.dispatcher.take_outgoing() {
                codec::write_message(&mut self.output, &notification).await?;
            }
            if let Some(response) = response {
                codec::write_message(&mut self.output, &response).await?;
            }

            if self.dispatcher.is_stopped() {
                return Ok(Some(self.dispatcher.exit_status()));
            }
        }

        Ok(None)
    }
}
