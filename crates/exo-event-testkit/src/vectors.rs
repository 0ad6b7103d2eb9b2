//! Golden test vectors for deterministic verification.
//!
//! A golden vector pins the exact digest (and optionally the exact canonical
//! bytes) of one logical event, or the exact rejection an encoder must
//! produce for an invalid one. Published vectors are never edited: a wrong
//! or outdated vector is superseded by a new one and kept for history.

use std::collections::HashSet;

use exo_event_core::{EventId, WIRE_FORMAT};
use thiserror::Error;

use crate::record::{EventRecord, PayloadRecord};

/// What an implementation must produce for a vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// The event encodes and hashes to this lowercase hex digest.
    Digest(String),
    /// Encoding fails with this rejection kind.
    Rejection(String),
}

/// Lifecycle state of a published vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorStatus {
    Active,
    Superseded { by: String, reason: String },
}

/// A golden test vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoldenVector {
    /// Stable identifier, unique within a registry.
    pub id: String,
    pub description: String,
    /// The logical construction of the event.
    pub event: EventRecord,
    /// Expected canonical bytes, lowercase hex.
    pub expected_canonical: Option<String>,
    pub expectation: Expectation,
    status: VectorStatus,
}

impl GoldenVector {
    /// A vector that must hash to `expected_digest`.
    pub fn digest(
        id: impl Into<String>,
        description: impl Into<String>,
        event: EventRecord,
        expected_digest: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            event,
            expected_canonical: None,
            expectation: Expectation::Digest(expected_digest.into()),
            status: VectorStatus::Active,
        }
    }

    /// A vector that must be rejected with `kind`.
    pub fn rejection(
        id: impl Into<String>,
        description: impl Into<String>,
        event: EventRecord,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            event,
            expected_canonical: None,
            expectation: Expectation::Rejection(kind.into()),
            status: VectorStatus::Active,
        }
    }

    pub fn with_canonical(mut self, canonical_hex: impl Into<String>) -> Self {
        self.expected_canonical = Some(canonical_hex.into());
        self
    }

    pub(crate) fn with_status(mut self, status: VectorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> &VectorStatus {
        &self.status
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self.status, VectorStatus::Superseded { .. })
    }

    pub fn superseded_by(&self) -> Option<&str> {
        match &self.status {
            VectorStatus::Superseded { by, .. } => Some(by),
            VectorStatus::Active => None,
        }
    }
}

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("vector `{0}` is already published")]
    DuplicateId(String),

    #[error("vector `{0}` is not published")]
    UnknownVector(String),

    #[error("vector `{0}` is already superseded")]
    AlreadySuperseded(String),

    #[error("vector `{0}` cannot supersede itself")]
    SelfSupersede(String),
}

/// An append-only collection of golden vectors for one wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    format: String,
    vectors: Vec<GoldenVector>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry for the current wire format.
    pub fn new() -> Self {
        Self::with_format(WIRE_FORMAT)
    }

    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            vectors: Vec::new(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Publish a vector. Identifiers are never reused.
    pub fn publish(&mut self, vector: GoldenVector) -> Result<(), RegistryError> {
        if self.get(&vector.id).is_some() {
            return Err(RegistryError::DuplicateId(vector.id));
        }
        tracing::debug!(vector = %vector.id, "published golden vector");
        self.vectors.push(vector);
        Ok(())
    }

    /// Publish `replacement` and mark `old_id` as superseded by it.
    ///
    /// The old vector's content is left untouched.
    pub fn supersede(
        &mut self,
        old_id: &str,
        replacement: GoldenVector,
        reason: impl Into<String>,
    ) -> Result<(), RegistryError> {
        if replacement.id == old_id {
            return Err(RegistryError::SelfSupersede(replacement.id));
        }
        let index = self
            .vectors
            .iter()
            .position(|v| v.id == old_id)
            .ok_or_else(|| RegistryError::UnknownVector(old_id.to_string()))?;
        if self.vectors[index].is_superseded() {
            return Err(RegistryError::AlreadySuperseded(old_id.to_string()));
        }

        let by = replacement.id.clone();
        self.publish(replacement)?;
        self.vectors[index].status = VectorStatus::Superseded {
            by,
            reason: reason.into(),
        };
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&GoldenVector> {
        self.vectors.iter().find(|v| v.id == id)
    }

    /// All vectors in publication order, superseded ones included.
    pub fn vectors(&self) -> &[GoldenVector] {
        &self.vectors
    }

    pub fn active(&self) -> impl Iterator<Item = &GoldenVector> {
        self.vectors.iter().filter(|v| !v.is_superseded())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Build a registry from vectors that already carry their status.
    ///
    /// Used when loading a file: every id must be unique and every
    /// `superseded_by` must name another vector in the set.
    pub(crate) fn from_published(
        format: impl Into<String>,
        vectors: Vec<GoldenVector>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for vector in &vectors {
            if !seen.insert(vector.id.as_str()) {
                return Err(RegistryError::DuplicateId(vector.id.clone()));
            }
        }
        for vector in &vectors {
            if let Some(by) = vector.superseded_by() {
                if by == vector.id {
                    return Err(RegistryError::SelfSupersede(vector.id.clone()));
                }
                if !seen.contains(by) {
                    return Err(RegistryError::UnknownVector(by.to_string()));
                }
            }
        }
        Ok(Self {
            format: format.into(),
            vectors,
        })
    }
}

const A: [u8; 32] = [0xaa; 32];
const B: [u8; 32] = [0xbb; 32];

/// Identifier of `genesis_event_v1`, the parent of `identity_created_v1`.
const GENESIS_V1_ID: [u8; 32] = [
    0xff, 0x4f, 0x44, 0xb8, 0xd2, 0x79, 0xa5, 0xf3, 0x8a, 0x3a, 0x17, 0x52, 0x39, 0x2f, 0x2e, 0xc3,
    0x9b, 0x55, 0x0f, 0x61, 0x66, 0x97, 0xc2, 0xcf, 0x84, 0xbc, 0xb6, 0x25, 0x82, 0xa1, 0x4f, 0x98,
];

const SIMPLE_V1_CANONICAL: &str = concat!(
    "a566617574686f726c6469643a65786f3a7465737467706172656e747380677061",
    "796c6f61648201430102036b6b65795f76657273696f6e016c6c6f676963616c5f",
    "74696d65a2676c6f676963616c006b706879736963616c5f6d731903e8",
);

const SIMPLE_V0_CANONICAL: &str = concat!(
    "a567706172656e7473806c6c6f676963616c5f74696d65a26b706879736963616c",
    "5f6d731903e8676c6f676963616c0066617574686f726c6469643a65786f3a7465",
    "73746b6b65795f76657273696f6e01677061796c6f6164a1664f70617175658301",
    "0203",
);

const ROOT_CANONICAL: &str = concat!(
    "a566617574686f726c6469643a65786f3a726f6f7467706172656e747380677061",
    "796c6f61648201406b6b65795f76657273696f6e006c6c6f676963616c5f74696d",
    "65a2676c6f676963616c006b706879736963616c5f6d7300",
);

const GENESIS_CANONICAL: &str = concat!(
    "a566617574686f726f6469643a65786f3a67656e6573697367706172656e747380",
    "677061796c6f61648202a16a6e6574776f726b5f69646b65786f2d6d61696e6e65",
    "746b6b65795f76657273696f6e016c6c6f676963616c5f74696d65a2676c6f6769",
    "63616c006b706879736963616c5f6d7301",
);

const INTEGER_WIDTH_CANONICAL: &str = concat!(
    "a566617574686f726c6469643a65786f3a7465737467706172656e747380677061",
    "796c6f616482015818000102030405060708090a0b0c0d0e0f1011121314151617",
    "6b6b65795f76657273696f6e18186c6c6f676963616c5f74696d65a2676c6f6769",
    "63616c1a000100006b706879736963616c5f6d731b0000000100000000",
);

const MAX_INTEGERS_CANONICAL: &str = concat!(
    "a566617574686f726c6469643a65786f3a7465737467706172656e747380677061",
    "796c6f6164820141006b6b65795f76657273696f6e1bffffffffffffffff6c6c6f",
    "676963616c5f74696d65a2676c6f676963616c1affffffff6b706879736963616c",
    "5f6d731bffffffffffffffff",
);

fn simple_opaque(key_version: u64) -> EventRecord {
    EventRecord::root(
        1000,
        0,
        "did:exo:test",
        key_version,
        PayloadRecord::opaque(vec![1, 2, 3]),
    )
}

/// Get all golden test vectors, in publication order.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector::digest(
            "simple_opaque_event_v0",
            "Simple opaque event, first published encoding",
            simple_opaque(1),
            "deec3ea32bddb3d99ee805b6ef4d31ed8eddcae952b1203826a0dbbe1ce74e7b",
        )
        .with_canonical(SIMPLE_V0_CANONICAL)
        .with_status(VectorStatus::Superseded {
            by: "simple_opaque_event_v1".into(),
            reason: "map keys were in declaration order and the payload was keyed by variant name"
                .into(),
        }),
        GoldenVector::digest(
            "simple_opaque_event_v1",
            "Root event with a three-byte opaque payload",
            simple_opaque(1),
            "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07",
        )
        .with_canonical(SIMPLE_V1_CANONICAL),
        GoldenVector::digest(
            "simple_opaque_event_key_v2",
            "Same event under key version 2",
            simple_opaque(2),
            "cbe14b72163323ce1f6bee29457273598b110150dba6c77ffe7e5bbf66a7e751",
        ),
        GoldenVector::digest(
            "root_empty_opaque_v1",
            "All-zero clock, key version 0, empty payload",
            EventRecord::root(0, 0, "did:exo:root", 0, PayloadRecord::opaque(vec![])),
            "aa5f8cdb7a00a9b3b6d68106dc931dcf76bba968611a6a687fb4d4aa0e733573",
        )
        .with_canonical(ROOT_CANONICAL),
        GoldenVector::digest(
            "two_parents_v1",
            "Two parents in stored order",
            EventRecord::root(
                1_736_870_400_000,
                7,
                "did:exo:alice",
                3,
                PayloadRecord::opaque(b"hello".to_vec()),
            )
            .with_parents([EventId(A), EventId(B)]),
            "ac9942f2443a7ac035a298f20ca090da470c16cabb2553072132860f66b4837b",
        ),
        GoldenVector::digest(
            "two_parents_swapped_v1",
            "Same parents in the opposite order",
            EventRecord::root(
                1_736_870_400_000,
                7,
                "did:exo:alice",
                3,
                PayloadRecord::opaque(b"hello".to_vec()),
            )
            .with_parents([EventId(B), EventId(A)]),
            "ba4b534a80a855468a64aaf2a55eb346cdaa88c89d5ad0e0988eb64f7134e697",
        ),
        GoldenVector::digest(
            "genesis_event_v1",
            "Genesis payload",
            EventRecord::root(
                1,
                0,
                "did:exo:genesis",
                1,
                PayloadRecord::genesis("exo-mainnet"),
            ),
            "ff4f44b8d279a5f38a3a1752392f2ec39b550f616697c2cf84bcb62582a14f98",
        )
        .with_canonical(GENESIS_CANONICAL),
        GoldenVector::digest(
            "identity_created_v1",
            "IdentityCreated payload whose parent is genesis_event_v1",
            EventRecord::root(
                2,
                0,
                "did:exo:alice",
                1,
                PayloadRecord::identity_created(
                    "bafyreigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
                ),
            )
            .with_parents([EventId(GENESIS_V1_ID)]),
            "a1cb52c1ee2f8be978113320f0d151733fd6a9e7be25cc334cbbd08225ae5ca7",
        ),
        GoldenVector::digest(
            "integer_width_boundaries_v1",
            "Integers one past each short-form width",
            EventRecord::root(
                1 << 32,
                65_536,
                "did:exo:test",
                24,
                PayloadRecord::opaque((0u8..24).collect::<Vec<_>>()),
            ),
            "2133a45a49ad5c1eecca870066b351dc3ac81e599d4ac7e0ef2a435331efac19",
        )
        .with_canonical(INTEGER_WIDTH_CANONICAL),
        GoldenVector::digest(
            "max_integers_v1",
            "Every integer field at its maximum",
            EventRecord::root(
                u64::MAX,
                u32::MAX.into(),
                "did:exo:test",
                u64::MAX,
                PayloadRecord::opaque(vec![0]),
            ),
            "7b607741637b1ff12c0aec23b63dba11edbca370f649cc4c7f61e289204583a1",
        )
        .with_canonical(MAX_INTEGERS_CANONICAL),
        GoldenVector::digest(
            "utf8_author_v1",
            "Author with multi-byte UTF-8 characters",
            EventRecord::root(
                1000,
                0,
                "did:exo:zoë-東京",
                1,
                PayloadRecord::opaque(vec![1, 2, 3]),
            ),
            "a8a97c023cf04c307b9c53d74c51bc6f8b25a25fb42616cc6f2fec0d522fe21b",
        ),
        GoldenVector::digest(
            "binary_payload_v1",
            "Opaque payload holding every byte value",
            EventRecord::root(
                1000,
                1,
                "did:exo:test",
                1,
                PayloadRecord::opaque((0u8..=255).collect::<Vec<_>>()),
            ),
            "10e888f319f6299ab84509e723b0b6ab972984c3be898e99eedd924cdd84caae",
        ),
        GoldenVector::digest(
            "large_payload_v1",
            "Two-kilobyte payload spanning several hash chunks",
            EventRecord::root(
                1000,
                2,
                "did:exo:test",
                1,
                PayloadRecord::opaque(vec![0x42; 2048]),
            )
            .with_parents([EventId(A)]),
            "710744337c88a0c8d1273a26e3b28f99153f1892629c506cf82ed3e2664cd7e7",
        ),
        GoldenVector::rejection(
            "undeclared_variant_rejected_v1",
            "Payload tag 99 is not declared",
            EventRecord::root(
                1000,
                0,
                "did:exo:test",
                1,
                PayloadRecord::with_tag(99, vec![1, 2, 3]),
            ),
            "undeclared_variant",
        ),
        GoldenVector::rejection(
            "logical_out_of_range_rejected_v1",
            "Logical counter does not fit in 32 bits",
            EventRecord::root(
                1000,
                1 << 32,
                "did:exo:test",
                1,
                PayloadRecord::opaque(vec![]),
            ),
            "integer_out_of_range",
        ),
        GoldenVector::rejection(
            "invalid_author_utf8_rejected_v1",
            "Author bytes are not valid UTF-8",
            EventRecord::root(1000, 0, "", 1, PayloadRecord::opaque(vec![]))
                .with_raw_author(vec![0xc3, 0x28]),
            "invalid_text",
        ),
    ]
}

/// The registry shipped with this crate.
pub fn builtin_registry() -> Registry {
    Registry {
        format: WIRE_FORMAT.to_string(),
        vectors: all_vectors(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_event_core::{canonical_bytes, hash_canonical};

    #[test]
    fn test_builtin_ids_are_unique() {
        let vectors = all_vectors();
        let ids: HashSet<_> = vectors.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.len(), vectors.len());

        let registry = builtin_registry();
        assert_eq!(
            Registry::from_published(registry.format(), registry.vectors().to_vec()).unwrap(),
            registry
        );
    }

    #[test]
    fn test_genesis_parent_constant() {
        let registry = builtin_registry();
        let genesis = registry.get("genesis_event_v1").unwrap();
        assert_eq!(
            genesis.expectation,
            Expectation::Digest(EventId(GENESIS_V1_ID).to_hex())
        );
    }

    #[test]
    fn test_active_vectors_match_reference_encoder() {
        for vector in builtin_registry().active() {
            let Expectation::Digest(expected) = &vector.expectation else {
                continue;
            };
            let event = vector.event.to_event().unwrap();
            let bytes = canonical_bytes(&event).unwrap();
            assert_eq!(&hash_canonical(&bytes).to_hex(), expected, "{}", vector.id);
            if let Some(canonical) = &vector.expected_canonical {
                assert_eq!(&hex::encode(&bytes), canonical, "{}", vector.id);
            }
        }
    }

    #[test]
    fn test_legacy_vector_is_superseded() {
        let registry = builtin_registry();
        let legacy = registry.get("simple_opaque_event_v0").unwrap();
        assert_eq!(legacy.superseded_by(), Some("simple_opaque_event_v1"));
        assert!(registry.active().all(|v| v.id != "simple_opaque_event_v0"));
        assert_eq!(registry.active().count(), registry.len() - 1);
    }

    #[test]
    fn test_publish_rejects_duplicate() {
        let mut registry = Registry::new();
        let vector = GoldenVector::digest("a", "", simple_opaque(1), "00");
        registry.publish(vector.clone()).unwrap();
        assert_eq!(
            registry.publish(vector),
            Err(RegistryError::DuplicateId("a".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_supersede_keeps_old_content() {
        let mut registry = Registry::new();
        let old = GoldenVector::digest("a_v1", "old", simple_opaque(1), "00");
        registry.publish(old.clone()).unwrap();

        let new = GoldenVector::digest("a_v2", "new", simple_opaque(1), "11");
        registry.supersede("a_v1", new, "wrong digest").unwrap();

        let kept = registry.get("a_v1").unwrap();
        assert_eq!(kept.event, old.event);
        assert_eq!(kept.expectation, old.expectation);
        assert_eq!(
            kept.status(),
            &VectorStatus::Superseded {
                by: "a_v2".into(),
                reason: "wrong digest".into()
            }
        );
        assert_eq!(registry.active().map(|v| v.id.as_str()).collect::<Vec<_>>(), ["a_v2"]);
    }

    #[test]
    fn test_supersede_errors() {
        let mut registry = Registry::new();
        registry
            .publish(GoldenVector::digest("a", "", simple_opaque(1), "00"))
            .unwrap();

        let b = GoldenVector::digest("b", "", simple_opaque(1), "00");
        assert_eq!(
            registry.supersede("missing", b.clone(), ""),
            Err(RegistryError::UnknownVector("missing".into()))
        );
        assert_eq!(
            registry.supersede("a", GoldenVector::digest("a", "", simple_opaque(1), "00"), ""),
            Err(RegistryError::SelfSupersede("a".into()))
        );

        registry.supersede("a", b, "").unwrap();
        assert_eq!(
            registry.supersede("a", GoldenVector::digest("c", "", simple_opaque(1), "00"), ""),
            Err(RegistryError::AlreadySuperseded("a".into()))
        );
    }

    #[test]
    fn test_from_published_rejects_dangling_supersede() {
        let vector = GoldenVector::digest("a", "", simple_opaque(1), "00").with_status(
            VectorStatus::Superseded {
                by: "nowhere".into(),
                reason: String::new(),
            },
        );
        assert_eq!(
            Registry::from_published(WIRE_FORMAT, vec![vector]),
            Err(RegistryError::UnknownVector("nowhere".into()))
        );
    }
}
