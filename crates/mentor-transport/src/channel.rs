//! The persistent transport channel contract and its handler registry.

use crate::error::TransportError;
use async_trait::async_trait;
use mentor_types::{ChannelState, ConversationIdentity, Envelope};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Callback invoked once per inbound envelope.
pub type MessageHandler = Box<dyn FnMut(Envelope) + Send + 'static>;

/// Identifies a registered handler so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// One ordered, bidirectional envelope stream scoped to an identity.
///
/// Implementations are internally synchronized: every method takes `&self`
/// so a disconnect can land while a connect is still in flight.
#[async_trait]
pub trait TransportChannel: Send + Sync {
    /// Opens the channel. Resolves only once the channel is `Open`.
    ///
    /// # Errors
    ///
    /// [`TransportError::Connect`] on network failure, remote rejection,
    /// timeout, or a disconnect during the handshake. The channel is then
    /// `Closed` and cannot be reused.
    async fn connect(&self, identity: &ConversationIdentity) -> Result<(), TransportError>;

    /// Queues an envelope for transmission.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotConnected`] unless the channel is `Open`.
    fn send(&self, envelope: Envelope) -> Result<(), TransportError>;

    /// Registers a handler for inbound envelopes. Handlers run sequentially
    /// in arrival order.
    fn on_message(&self, handler: MessageHandler) -> HandlerId;

    /// Removes a handler. Returns `false` if it was not registered.
    fn remove_handler(&self, id: HandlerId) -> bool;

    /// Closes the channel. Idempotent.
    fn disconnect(&self);

    fn state(&self) -> ChannelState;
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: Vec<(HandlerId, MessageHandler)>,
}

/// Ordered set of inbound handlers shared between a channel and its reader.
///
/// Handlers run with the registry locked; they must not register or remove
/// handlers themselves.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: MessageHandler) -> HandlerId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = HandlerId(inner.next_id);
        inner.handlers.push((id, handler));
        id
    }

    pub fn remove(&self, id: HandlerId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = inner.handlers.len();
        inner.handlers.retain(|(existing, _)| *existing != id);
        inner.handlers.len() != before
    }

    /// Delivers one envelope to every handler in registration order.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, envelope: Envelope) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let count = inner.handlers.len();
        match inner.handlers.split_last_mut() {
            Some(((_, last), rest)) => {
                for (_, handler) in rest {
                    handler(envelope.clone());
                }
                last(envelope);
            }
            None => {
                tracing::debug!(kind = envelope.kind.label(), "no handler registered for envelope");
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handlers
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> MessageHandler {
        let counter = counter.clone();
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn dispatch_reaches_every_handler_once() {
        let registry = HandlerRegistry::new();
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));
        registry.register(counting_handler(&a));
        registry.register(counting_handler(&b));

        let delivered = registry.dispatch(Envelope::error(ConversationIdentity::from(1), "x"));

        assert_eq!(delivered, 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_handler_is_not_invoked() {
        let registry = HandlerRegistry::new();
        let a = Arc::new(AtomicUsize::new(0));
        let id = registry.register(counting_handler(&a));

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(
            registry.dispatch(Envelope::error(ConversationIdentity::from(1), "x")),
            0
        );
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn handlers_see_arrival_order() {
        let registry = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.register(Box::new(move |env: Envelope| {
            sink.lock().unwrap().push(env.content)
        }));

        for text in ["one", "two", "three"] {
            registry.dispatch(Envelope::text_response(ConversationIdentity::from(1), text));
        }

        assert_eq!(*seen.lock().unwrap(), vec!["one", "two", "three"]);
    }
}
