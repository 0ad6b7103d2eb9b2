//! Event: the unit of the causal log.
//!
//! An event is immutable once built. Its identity is not a field; it is
//! always derived from the canonical bytes (see [`Event::compute_id`]).

use bytes::Bytes;

use crate::canonical::canonical_bytes;
use crate::digest::hash_canonical;
use crate::error::EncodingError;
use crate::hlc::HybridLogicalClock;
use crate::types::{Did, EventId};

/// Stable wire tags for payload variants.
///
/// Tags are allocated once and never reused or renumbered. Tag 0 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum PayloadTag {
    /// Uninterpreted bytes.
    Opaque = 1,
    /// First event of a network.
    Genesis = 2,
    /// An identity document was published.
    IdentityCreated = 3,
}

impl PayloadTag {
    /// Every declared tag, in allocation order.
    pub const ALL: [PayloadTag; 3] = [Self::Opaque, Self::Genesis, Self::IdentityCreated];

    /// Convert to the wire integer.
    pub fn to_u64(self) -> u64 {
        self as u64
    }

    /// Try to parse from the wire integer.
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Opaque),
            2 => Some(Self::Genesis),
            3 => Some(Self::IdentityCreated),
            _ => None,
        }
    }
}

impl TryFrom<u64> for PayloadTag {
    type Error = EncodingError;

    fn try_from(tag: u64) -> Result<Self, Self::Error> {
        Self::from_u64(tag).ok_or(EncodingError::UndeclaredVariant { tag })
    }
}

/// The event payload, a tagged union.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventPayload {
    /// Uninterpreted bytes, encoded as a raw byte string.
    Opaque(Bytes),
    /// Network bootstrap.
    Genesis { network_id: String },
    /// Identity document announcement.
    IdentityCreated { did_doc_cid: String },
}

impl EventPayload {
    /// Convenience constructor for opaque payloads.
    pub fn opaque(bytes: impl Into<Bytes>) -> Self {
        Self::Opaque(bytes.into())
    }

    /// The wire tag of this variant.
    pub fn tag(&self) -> PayloadTag {
        match self {
            Self::Opaque(_) => PayloadTag::Opaque,
            Self::Genesis { .. } => PayloadTag::Genesis,
            Self::IdentityCreated { .. } => PayloadTag::IdentityCreated,
        }
    }
}

/// A causally-linked event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    parents: Vec<EventId>,
    logical_time: HybridLogicalClock,
    author: Did,
    key_version: u64,
    payload: EventPayload,
}

impl Event {
    pub fn new(
        parents: Vec<EventId>,
        logical_time: HybridLogicalClock,
        author: Did,
        key_version: u64,
        payload: EventPayload,
    ) -> Self {
        Self {
            parents,
            logical_time,
            author,
            key_version,
            payload,
        }
    }

    /// Start building an event for the given author.
    pub fn builder(author: impl Into<Did>) -> EventBuilder {
        EventBuilder::new(author.into())
    }

    /// Parent event ids, in authored order.
    pub fn parents(&self) -> &[EventId] {
        &self.parents
    }

    pub fn logical_time(&self) -> HybridLogicalClock {
        self.logical_time
    }

    pub fn author(&self) -> &Did {
        &self.author
    }

    pub fn key_version(&self) -> u64 {
        self.key_version
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Check if this event has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Canonical CBOR bytes of this event.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        canonical_bytes(self)
    }

    /// Compute the event ID (Blake3 hash of canonical bytes).
    pub fn compute_id(&self) -> Result<EventId, EncodingError> {
        let bytes = canonical_bytes(self)?;
        Ok(hash_canonical(&bytes))
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    parents: Vec<EventId>,
    logical_time: HybridLogicalClock,
    author: Did,
    key_version: u64,
    payload: EventPayload,
}

impl EventBuilder {
    /// Start building an event. Defaults: no parents, zero clock, key
    /// version 0, empty opaque payload.
    pub fn new(author: Did) -> Self {
        Self {
            parents: Vec::new(),
            logical_time: HybridLogicalClock::default(),
            author,
            key_version: 0,
            payload: EventPayload::Opaque(Bytes::new()),
        }
    }

    /// Append a parent. Order is preserved.
    pub fn parent(mut self, id: EventId) -> Self {
        self.parents.push(id);
        self
    }

    /// Append several parents, in iteration order.
    pub fn parents(mut self, ids: impl IntoIterator<Item = EventId>) -> Self {
        self.parents.extend(ids);
        self
    }

    pub fn logical_time(mut self, hlc: HybridLogicalClock) -> Self {
        self.logical_time = hlc;
        self
    }

    pub fn key_version(mut self, version: u64) -> Self {
        self.key_version = version;
        self
    }

    pub fn payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn build(self) -> Event {
        Event {
            parents: self.parents,
            logical_time: self.logical_time,
            author: self.author,
            key_version: self.key_version,
            payload: self.payload,
        }
    }
}
