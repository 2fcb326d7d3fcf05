use crate::feed::filter::{EventMeta, SubscriberFilter};
use actix_web::web::Bytes;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// One connected live feed viewer
///
/// Owns the sending half of the connection's channel; the receiving half
/// drives the SSE response stream. Removed from the registry on disconnect
/// or on the first failed write.
#[derive(Debug)]
struct Subscriber {
    filter: SubscriberFilter,
    tx: UnboundedSender<Bytes>,
}

/// Raw subscription handle; the caller owns the unregistration
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub rx: UnboundedReceiver<Bytes>,
}

/// Subscription tied to the connection lifetime
///
/// Dropping the handle unregisters the subscriber, so a client that
/// disconnects without ever failing a write still leaves the registry
/// immediately instead of lingering until the next broadcast.
#[derive(Debug)]
pub struct FeedConnection {
    id: Uuid,
    rx: UnboundedReceiver<Bytes>,
    registry: Arc<FeedRegistry>,
}

impl FeedConnection {
    /// Register a subscriber whose registry entry lives as long as the handle
    ///
    /// This is what the streaming route uses; the returned connection
    /// unregisters itself on drop.
    pub fn open(registry: &Arc<FeedRegistry>, filter: SubscriberFilter) -> Self {
        let Subscription { id, rx } = registry.subscribe(filter);
        Self {
            id,
            rx,
            registry: Arc::clone(registry),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next frame for this subscriber; `None` once the registry drops it
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Drop for FeedConnection {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
    }
}

/// Registry of live feed subscribers with filtered fan-out
///
/// Injected per server instance (held in the shared application state), so
/// tests construct and tear one down deterministically. Delivery is
/// at-most-once and best-effort by design: events are not buffered for
/// absent subscribers, a failed write closes that one subscriber and is
/// never retried. Writes go through per-subscriber unbounded channels, so a
/// slow consumer cannot stall the broadcast to the rest.
#[derive(Debug, Default)]
pub struct FeedRegistry {
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; returns its id and the stream-side receiver
    pub fn subscribe(&self, filter: SubscriberFilter) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        self.write_lock().insert(id, Subscriber { filter, tx });

        tracing::debug!("Feed subscriber {} connected", id);
        Subscription { id, rx }
    }

    /// Remove a subscriber; idempotent
    pub fn unsubscribe(&self, id: Uuid) {
        if self.write_lock().remove(&id).is_some() {
            tracing::debug!("Feed subscriber {} disconnected", id);
        }
    }

    /// Number of currently connected subscribers
    pub fn active_connections(&self) -> usize {
        self.read_lock().len()
    }

    /// Send one event to one subscriber, bypassing filters
    ///
    /// Used for per-connection control events (e.g. the connect handshake).
    pub fn send_direct(&self, id: Uuid, event: &str, payload: &Value) {
        let failed = {
            let subscribers = self.read_lock();
            match subscribers.get(&id) {
                Some(subscriber) => subscriber.tx.send(format_sse(event, payload)).is_err(),
                None => false,
            }
        };
        if failed {
            self.unsubscribe(id);
        }
    }

    /// Fan an event out to every subscriber whose filter matches
    ///
    /// Zone metadata is derived from the payload (`zoneId` /
    /// `allowOutOfZone`, falling back to the nested `post`). Non-matching
    /// subscribers are skipped silently. Subscribers whose channel is gone
    /// are removed afterwards. Returns the number of deliveries.
    pub fn broadcast(&self, event: &str, payload: &Value) -> usize {
        let meta = EventMeta::from_payload(payload);
        let frame = format_sse(event, payload);

        let mut delivered = 0usize;
        let mut failed: Vec<Uuid> = Vec::new();

        {
            let subscribers = self.read_lock();
            for (id, subscriber) in subscribers.iter() {
                if !subscriber.filter.matches(&meta) {
                    continue;
                }
                if subscriber.tx.send(frame.clone()).is_ok() {
                    delivered += 1;
                } else {
                    failed.push(*id);
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.write_lock();
            for id in failed {
                subscribers.remove(&id);
                tracing::debug!("Feed subscriber {} dropped on failed write", id);
            }
        }

        tracing::trace!("Broadcast {} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Drop every subscriber, terminating all open streams
    pub fn shutdown(&self) {
        let count = {
            let mut subscribers = self.write_lock();
            let count = subscribers.len();
            subscribers.clear();
            count
        };
        if count > 0 {
            tracing::info!("Feed registry shut down, closed {} subscribers", count);
        }
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Subscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Subscriber>> {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Serialize one event in SSE wire format
///
/// Exactly `event: <name>\ndata: <json>\n\n`; a null or unserializable
/// payload becomes `{}`.
pub fn format_sse(event: &str, payload: &Value) -> Bytes {
    let data = if payload.is_null() {
        "{}".to_string()
    } else {
        serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
    };

    Bytes::from(format!("event: {}\ndata: {}\n\n", event, data))
}
