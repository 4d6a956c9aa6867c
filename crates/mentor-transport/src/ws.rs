//! WebSocket implementation of the persistent transport channel.

use crate::channel::{HandlerId, HandlerRegistry, MessageHandler, TransportChannel};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use mentor_types::{ChannelState, ConversationIdentity, Envelope};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default time allowed for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to open the conversation socket.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Base URL of the conversation endpoint, e.g. `ws://localhost:8000`.
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl WsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Address of the conversation socket for `identity`.
    pub fn endpoint_url(&self, identity: &ConversationIdentity) -> String {
        format!("{}/ws/{}", self.base_url.trim_end_matches('/'), identity)
    }
}

struct Lifecycle {
    state: ChannelState,
    /// Set by the first `connect`; an instance is never connected twice.
    started: bool,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    reader: Option<JoinHandle<()>>,
}

struct Shared {
    lifecycle: Mutex<Lifecycle>,
    handlers: HandlerRegistry,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Moves to `Closed`, dropping the outbound queue so the writer task
    /// sends a close frame and exits. Returns `false` if already closed.
    fn close(&self, abort_reader: bool) -> bool {
        let mut lifecycle = self.lock();
        if lifecycle.state == ChannelState::Closed {
            return false;
        }
        lifecycle.state = ChannelState::Closed;
        lifecycle.outbound = None;
        if let Some(reader) = lifecycle.reader.take() {
            if abort_reader {
                reader.abort();
            }
        }
        true
    }
}

/// Persistent conversation channel over a WebSocket.
///
/// A writer task drains an unbounded queue into the socket so `send` never
/// blocks; a reader task parses inbound frames and dispatches them to the
/// registered handlers in arrival order.
pub struct WsTransport {
    config: WsConfig,
    shared: Arc<Shared>,
}

impl WsTransport {
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle {
                    state: ChannelState::Connecting,
                    started: false,
                    outbound: None,
                    reader: None,
                }),
                handlers: HandlerRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    async fn handshake(&self, url: &str) -> Result<WsStream, TransportError> {
        match tokio::time::timeout(self.config.connect_timeout, connect_async(url)).await {
            Ok(Ok((stream, response))) => {
                tracing::debug!(url = %url, status = %response.status(), "websocket handshake complete");
                Ok(stream)
            }
            Ok(Err(e)) => Err(TransportError::Connect(e.to_string())),
            Err(_) => Err(TransportError::Connect(format!(
                "handshake timed out after {:?}",
                self.config.connect_timeout
            ))),
        }
    }
}

#[async_trait]
impl TransportChannel for WsTransport {
    async fn connect(&self, identity: &ConversationIdentity) -> Result<(), TransportError> {
        {
            let mut lifecycle = self.shared.lock();
            if lifecycle.started || lifecycle.state == ChannelState::Closed {
                return Err(TransportError::Connect(
                    "channel instance already used; construct a new one".to_string(),
                ));
            }
            lifecycle.started = true;
        }

        let url = self.config.endpoint_url(identity);
        tracing::info!(identity = %identity, url = %url, "opening conversation channel");

        let stream = match self.handshake(&url).await {
            Ok(stream) => stream,
            Err(e) => {
                self.shared.close(true);
                tracing::warn!(identity = %identity, error = %e, "conversation channel handshake failed");
                return Err(e);
            }
        };

        let (sink, stream) = stream.split();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut lifecycle = self.shared.lock();
        if lifecycle.state == ChannelState::Closed {
            drop(lifecycle);
            tracing::info!(identity = %identity, "disconnected during handshake; closing socket");
            drop(tx);
            tokio::spawn(write_loop(sink, rx));
            return Err(TransportError::Connect(
                "disconnected during handshake".to_string(),
            ));
        }

        lifecycle.state = ChannelState::Open;
        lifecycle.outbound = Some(tx);
        tokio::spawn(write_loop(sink, rx));
        lifecycle.reader = Some(tokio::spawn(read_loop(stream, self.shared.clone())));

        tracing::info!(identity = %identity, "conversation channel open");
        Ok(())
    }

    fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let lifecycle = self.shared.lock();
        let (ChannelState::Open, Some(outbound)) = (lifecycle.state, lifecycle.outbound.as_ref())
        else {
            return Err(TransportError::NotConnected(lifecycle.state));
        };

        let json = serde_json::to_string(&envelope)?;
        outbound
            .send(Message::Text(json.into()))
            .map_err(|_| TransportError::NotConnected(ChannelState::Closed))?;

        tracing::debug!(kind = envelope.kind.label(), "queued envelope");
        Ok(())
    }

    fn on_message(&self, handler: MessageHandler) -> HandlerId {
        self.shared.handlers.register(handler)
    }

    fn remove_handler(&self, id: HandlerId) -> bool {
        self.shared.handlers.remove(id)
    }

    fn disconnect(&self) {
        if self.shared.close(true) {
            tracing::info!("conversation channel disconnected");
        }
    }

    fn state(&self) -> ChannelState {
        self.shared.lock().state
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.shared.close(true);
    }
}

/// Forwards queued frames to the socket. When the queue closes, sends a
/// close frame and exits.
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = rx.recv().await {
        if let Err(e) = sink.send(message).await {
            tracing::warn!(error = %e, "failed to write to conversation channel");
            break;
        }
    }
    if let Err(e) = sink.close().await {
        tracing::debug!(error = %e, "conversation channel close frame not delivered");
    }
}

/// Parses inbound frames and hands each envelope to the handlers.
///
/// A frame that is not a valid envelope is logged and skipped; it never
/// stops delivery of the frames behind it.
async fn read_loop(mut stream: SplitStream<WsStream>, shared: Arc<Shared>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(text.as_str()) {
                Ok(envelope) => {
                    shared.handlers.dispatch(envelope);
                }
                Err(e) => {
                    tracing::warn!(error = %e, bytes = text.len(), "dropping malformed envelope");
                }
            },
            Ok(Message::Close(frame)) => {
                tracing::debug!(?frame, "conversation endpoint closed the channel");
                break;
            }
            Ok(Message::Binary(payload)) => {
                tracing::warn!(bytes = payload.len(), "dropping binary frame; envelopes are text");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "conversation channel read failed");
                break;
            }
        }
    }

    if shared.close(false) {
        tracing::info!("conversation channel closed by remote");
    }
}
