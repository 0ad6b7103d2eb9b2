//! Test fixtures and helpers.
//!
//! Common setup code for tests that need small causal graphs of events.

use std::collections::HashMap;

use exo_event_core::{Did, EncodingError, Event, EventId, EventPayload, HybridLogicalClock};

/// Builds events for one author, stamping clocks from their parents.
///
/// Every event added is kept so later events can reference it by id.
#[derive(Debug, Clone)]
pub struct DagFixture {
    author: Did,
    key_version: u64,
    events: HashMap<EventId, Event>,
}

impl DagFixture {
    pub fn new(author: impl Into<Did>) -> Self {
        Self {
            author: author.into(),
            key_version: 1,
            events: HashMap::new(),
        }
    }

    pub fn with_key_version(mut self, key_version: u64) -> Self {
        self.key_version = key_version;
        self
    }

    /// Add a root event observed at `node_time`.
    pub fn root(
        &mut self,
        node_time: u64,
        payload: EventPayload,
    ) -> Result<EventId, EncodingError> {
        self.child(&[], node_time, payload)
    }

    /// Add an event on top of `parents`, which must already be in the fixture.
    ///
    /// Unknown parents are still referenced but contribute no clock.
    pub fn child(
        &mut self,
        parents: &[EventId],
        node_time: u64,
        payload: EventPayload,
    ) -> Result<EventId, EncodingError> {
        let parent_times: Vec<HybridLogicalClock> = parents
            .iter()
            .filter_map(|id| self.events.get(id))
            .map(Event::logical_time)
            .collect();

        let event = Event::builder(self.author.clone())
            .parents(parents.iter().copied())
            .logical_time(HybridLogicalClock::new_event(node_time, &parent_times))
            .key_version(self.key_version)
            .payload(payload)
            .build();

        let id = event.compute_id()?;
        self.events.insert(id, event);
        Ok(id)
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// The `simple_opaque_event` reference event at a given key version.
pub fn simple_opaque_event(key_version: u64) -> Event {
    Event::builder("did:exo:test")
        .logical_time(HybridLogicalClock::new(1000, 0))
        .key_version(key_version)
        .payload(EventPayload::opaque(vec![1, 2, 3]))
        .build()
}

/// Create fixtures for several authors.
pub fn multi_author_fixtures(count: usize) -> Vec<DagFixture> {
    (0..count)
        .map(|i| DagFixture::new(format!("did:exo:author{}", i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_opaque_event_id() {
        assert_eq!(
            simple_opaque_event(1).compute_id().unwrap().to_hex(),
            "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07"
        );
    }

    #[test]
    fn test_fixture_chain() {
        let mut dag = DagFixture::new("did:exo:alice");

        let genesis = dag
            .root(
                5000,
                EventPayload::Genesis {
                    network_id: "exo-testnet".into(),
                },
            )
            .unwrap();
        let e1 = dag.child(&[genesis], 5000, EventPayload::opaque(b"one".to_vec())).unwrap();
        let e2 = dag.child(&[e1], 4000, EventPayload::opaque(b"two".to_vec())).unwrap();

        assert_eq!(dag.len(), 3);
        assert!(dag.get(&genesis).unwrap().is_root());
        assert_eq!(dag.get(&e1).unwrap().parents(), &[genesis]);
        assert_eq!(dag.get(&e1).unwrap().logical_time(), HybridLogicalClock::new(5000, 1));
        // Node clock behind the parent: physical time is carried forward.
        assert_eq!(dag.get(&e2).unwrap().logical_time(), HybridLogicalClock::new(5000, 2));
    }

    #[test]
    fn test_fixture_merge() {
        let mut dag = DagFixture::new("did:exo:alice");
        let a = dag.root(100, EventPayload::opaque(b"a".to_vec())).unwrap();
        let b = dag.root(200, EventPayload::opaque(b"b".to_vec())).unwrap();

        let ab = dag.child(&[a, b], 150, EventPayload::opaque(vec![])).unwrap();
        let ba = dag.child(&[b, a], 150, EventPayload::opaque(vec![])).unwrap();

        assert_ne!(ab, ba);
        assert_eq!(dag.get(&ab).unwrap().logical_time(), HybridLogicalClock::new(200, 1));
    }

    #[test]
    fn test_key_version_changes_ids() {
        let mut v1 = DagFixture::new("did:exo:alice");
        let mut v2 = DagFixture::new("did:exo:alice").with_key_version(2);
        let payload = EventPayload::opaque(vec![7]);
        assert_ne!(
            v1.root(1, payload.clone()).unwrap(),
            v2.root(1, payload).unwrap()
        );
    }

    #[test]
    fn test_multi_author() {
        let mut authors = multi_author_fixtures(3);
        let ids: Vec<_> = authors
            .iter_mut()
            .map(|dag| dag.root(1, EventPayload::opaque(vec![])).unwrap())
            .collect();

        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
        assert_ne!(ids[0], ids[2]);
    }
}
