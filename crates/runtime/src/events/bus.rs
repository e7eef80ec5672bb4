//! Topic-based replication bus.
//!
//! Every instance of a session holds a clone of the same bus. Frames are
//! published as encoded bytes tagged with the sender's [`PeerId`]; receivers
//! skip their own frames because the sender already applied them locally.
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use super::wire::{self, Frame, WireError};

/// Identity of one instance on the bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u32);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Topics for frame routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Authoritative agent events
    Replication,
    /// Damage forwarded by non-authoritative instances
    Intake,
    /// Session housekeeping such as resync requests
    Control,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Replication, Topic::Intake, Topic::Control];
}

/// One frame on the wire, still encoded.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: PeerId,
    pub topic: Topic,
    pub payload: Arc<[u8]>,
}

impl Envelope {
    pub fn decode(&self) -> Result<Frame, WireError> {
        wire::decode(&self.payload)
    }
}

/// Replication bus shared by every instance of a session.
///
/// Broadcast channels are created up front, one per topic. A receiver that
/// falls more than `capacity` frames behind observes
/// [`broadcast::error::RecvError::Lagged`] and must resync.
///
/// Forwarded damage cannot be recovered by a resync, so intake frames are
/// also delivered to per-peer inboxes that never drop a frame.
#[derive(Clone)]
pub struct ReplicationBus {
    replication: broadcast::Sender<Envelope>,
    intake: broadcast::Sender<Envelope>,
    control: broadcast::Sender<Envelope>,
    inboxes: Arc<Mutex<Vec<(PeerId, mpsc::UnboundedSender<Envelope>)>>>,
}

impl ReplicationBus {
    /// Creates a new bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Creates a new bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            replication: broadcast::channel(capacity).0,
            intake: broadcast::channel(capacity).0,
            control: broadcast::channel(capacity).0,
            inboxes: Arc::default(),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Envelope> {
        match topic {
            Topic::Replication => &self.replication,
            Topic::Intake => &self.intake,
            Topic::Control => &self.control,
        }
    }

    /// Encodes and publishes a frame on its topic.
    ///
    /// Returns the number of receivers that will see it. Having no receivers
    /// is not an error: a lone instance publishes into the void.
    pub fn publish(&self, origin: PeerId, frame: &Frame) -> Result<usize, WireError> {
        let topic = frame.topic();
        let envelope = Envelope {
            origin,
            topic,
            payload: wire::encode(frame)?.into(),
        };
        let delivered = if topic == Topic::Intake {
            self.deliver_to_inboxes(&envelope)
        } else {
            0
        };
        Ok(delivered + self.sender(topic).send(envelope).unwrap_or(0))
    }

    /// Opens a lossless inbox for intake frames published by other peers.
    ///
    /// The inbox is dropped from the bus once its receiver is gone.
    pub fn open_inbox(&self, peer: PeerId) -> mpsc::UnboundedReceiver<Envelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inboxes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((peer, tx));
        rx
    }

    fn deliver_to_inboxes(&self, envelope: &Envelope) -> usize {
        let mut inboxes = self.inboxes.lock().unwrap_or_else(PoisonError::into_inner);
        inboxes.retain(|(_, tx)| !tx.is_closed());
        let mut delivered = 0;
        for (peer, tx) in inboxes.iter() {
            if *peer != envelope.origin && tx.send(envelope.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Envelope> {
        self.sender(topic).subscribe()
    }

    pub fn receiver_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }
}

impl Default for ReplicationBus {
    fn default() -> Self {
        Self::new()
    }
}
