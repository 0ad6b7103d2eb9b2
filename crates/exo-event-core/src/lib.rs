//! # exo-event core
//!
//! Pure primitives for the exo event log: the event model, its canonical
//! encoding, and content addressing.
//!
//! This crate contains no I/O, no storage, no networking. Every function is
//! a pure computation over its inputs and safe to call from any thread.
//!
//! ## Key Types
//!
//! - [`Event`] - The unit of the causal log
//! - [`EventId`] - Content-addressed identifier (Blake3 hash)
//! - [`EventPayload`] - Tagged union with stable [`PayloadTag`]s
//! - [`HybridLogicalClock`] - Physical milliseconds plus logical counter
//!
//! ## Canonicalization
//!
//! Events are encoded using deterministic CBOR. See the [`canonical`] module
//! for the exact rules.
//!
//! ```rust
//! use exo_event_core::{Event, EventPayload, HybridLogicalClock};
//!
//! let event = Event::builder("did:exo:test")
//!     .logical_time(HybridLogicalClock::new(1000, 0))
//!     .key_version(1)
//!     .payload(EventPayload::opaque(vec![1, 2, 3]))
//!     .build();
//!
//! let id = event.compute_id().unwrap();
//! assert_eq!(
//!     id.to_hex(),
//!     "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07"
//! );
//! ```

pub mod canonical;
pub mod digest;
pub mod error;
pub mod event;
pub mod hlc;
pub mod types;

pub use canonical::{
    canonical_bytes, decode_event, encode_value, CanonicalEncoder, CborEncoder, WIRE_FORMAT,
};
pub use digest::{hash_canonical, Blake3Hasher, ContentHasher, HASH_ALGORITHM};
pub use error::{DecodingError, EncodingError};
pub use event::{Event, EventBuilder, EventPayload, PayloadTag};
pub use hlc::HybridLogicalClock;
pub use types::{Did, EventId, EVENT_ID_LEN};
