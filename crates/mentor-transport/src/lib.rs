//! Conversation channels for the Strike Mentor client.
//!
//! Two independent ways to reach the assistant:
//!
//! - [`TransportChannel`]: one persistent, ordered, bidirectional envelope
//!   stream per identity. Replies are pushed to registered handlers.
//!   [`WsTransport`] implements it over a WebSocket.
//! - [`FallbackChannel`]: a stateless request/response call used while the
//!   persistent channel is unavailable. [`HttpFallback`] implements it over
//!   the endpoint's chat route.
//!
//! The two are never ordered with respect to each other.

pub mod channel;
pub mod error;
pub mod fallback;
pub mod ws;

pub use channel::{HandlerId, HandlerRegistry, MessageHandler, TransportChannel};
pub use error::{RequestError, TransportError};
pub use fallback::{FallbackChannel, HttpFallback, DEFAULT_REQUEST_TIMEOUT};
pub use ws::{WsConfig, WsTransport, DEFAULT_CONNECT_TIMEOUT};
