//! Proptest generators for property-based testing.

use proptest::prelude::*;

use exo_event_core::{Did, Event, EventId, EventPayload, HybridLogicalClock};

/// Generate a random EventId.
pub fn event_id() -> impl Strategy<Value = EventId> {
    any::<[u8; 32]>().prop_map(EventId::from_bytes)
}

/// Generate a parent list of up to `max_len` ids.
pub fn parents(max_len: usize) -> impl Strategy<Value = Vec<EventId>> {
    prop::collection::vec(event_id(), 0..=max_len)
}

/// Generate any clock value, including the extremes.
pub fn clock() -> impl Strategy<Value = HybridLogicalClock> {
    (any::<u64>(), any::<u32>()).prop_map(|(physical_ms, logical)| {
        HybridLogicalClock::new(physical_ms, logical)
    })
}

/// Generate a DID-shaped author, sometimes with non-ASCII characters.
pub fn did() -> impl Strategy<Value = Did> {
    prop_oneof![
        "did:exo:[a-z0-9]{1,24}".prop_map(Did::from),
        "did:exo:\\PC{1,12}".prop_map(Did::from),
    ]
}

/// Generate payload bytes of specified max length.
pub fn payload_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a payload of any declared variant.
pub fn payload() -> impl Strategy<Value = EventPayload> {
    prop_oneof![
        payload_bytes(512).prop_map(|bytes| EventPayload::opaque(bytes)),
        "[a-z0-9-]{1,32}".prop_map(|network_id| EventPayload::Genesis { network_id }),
        "bafy[a-z2-7]{20,55}"
            .prop_map(|did_doc_cid| EventPayload::IdentityCreated { did_doc_cid }),
    ]
}

/// Parameters for generating an event.
#[derive(Debug, Clone)]
pub struct EventParams {
    pub parents: Vec<EventId>,
    pub logical_time: HybridLogicalClock,
    pub author: Did,
    pub key_version: u64,
    pub payload: EventPayload,
}

impl EventParams {
    pub fn build(&self) -> Event {
        Event::new(
            self.parents.clone(),
            self.logical_time,
            self.author.clone(),
            self.key_version,
            self.payload.clone(),
        )
    }
}

impl Arbitrary for EventParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (parents(4), clock(), did(), any::<u64>(), payload())
            .prop_map(
                |(parents, logical_time, author, key_version, payload)| EventParams {
                    parents,
                    logical_time,
                    author,
                    key_version,
                    payload,
                },
            )
            .boxed()
    }
}

/// Generate an event.
pub fn event() -> impl Strategy<Value = Event> {
    any::<EventParams>().prop_map(|params| params.build())
}
