//! Language-neutral event records.
//!
//! An [`EventRecord`] is the logical construction of an event as written in
//! a vector file: plain integers, lowercase hex for bytes, and numeric
//! payload tags. Converting a record into an [`Event`] is where undeclared
//! tags, out-of-range integers, and invalid text are caught.

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use exo_event_core::{
    Did, EncodingError, Event, EventId, EventPayload, HybridLogicalClock, PayloadTag,
};

/// Errors turning a record into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("payload tag {tag} requires field `{field}`")]
    MissingBody { tag: u64, field: &'static str },

    #[error("payload tag {tag} does not take field `{field}`")]
    UnexpectedBody { tag: u64, field: &'static str },
}

/// Bytes written as a lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexBytes(pub Vec<u8>);

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(HexBytes).map_err(D::Error::custom)
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Clock fields, kept as wide integers so range violations can be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockRecord {
    pub physical_ms: u64,
    pub logical: u64,
}

/// An author: normally a JSON string, or raw bytes that may not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRecord {
    Text(String),
    Raw(RawAuthor),
}

/// Author bytes given as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawAuthor {
    pub utf8_hex: HexBytes,
}

/// A payload: a numeric tag plus the body field that tag declares.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayloadRecord {
    pub tag: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<HexBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_doc_cid: Option<String>,
}

impl PayloadRecord {
    pub fn opaque(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            tag: PayloadTag::Opaque.to_u64(),
            bytes: Some(HexBytes(bytes.into())),
            ..Self::default()
        }
    }

    pub fn genesis(network_id: &str) -> Self {
        Self {
            tag: PayloadTag::Genesis.to_u64(),
            network_id: Some(network_id.to_string()),
            ..Self::default()
        }
    }

    pub fn identity_created(did_doc_cid: &str) -> Self {
        Self {
            tag: PayloadTag::IdentityCreated.to_u64(),
            did_doc_cid: Some(did_doc_cid.to_string()),
            ..Self::default()
        }
    }

    /// A payload carrying an arbitrary, possibly undeclared, tag.
    pub fn with_tag(tag: u64, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            bytes: Some(HexBytes(bytes.into())),
            ..Self::default()
        }
    }

    /// Check that a declared tag carries exactly its own body field.
    ///
    /// Undeclared tags pass: rejecting them is the encoder's job.
    pub fn check_shape(&self) -> Result<(), RecordError> {
        let Some(tag) = PayloadTag::from_u64(self.tag) else {
            return Ok(());
        };
        let present = [
            ("bytes", self.bytes.is_some()),
            ("network_id", self.network_id.is_some()),
            ("did_doc_cid", self.did_doc_cid.is_some()),
        ];
        let required = body_field(tag);

        for (field, is_present) in present {
            if field == required && !is_present {
                return Err(RecordError::MissingBody {
                    tag: self.tag,
                    field,
                });
            }
            if field != required && is_present {
                return Err(RecordError::UnexpectedBody {
                    tag: self.tag,
                    field,
                });
            }
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Result<EventPayload, RecordError> {
        let tag = PayloadTag::try_from(self.tag)?;
        self.check_shape()?;

        let missing = || RecordError::MissingBody {
            tag: self.tag,
            field: body_field(tag),
        };

        let payload = match tag {
            PayloadTag::Opaque => {
                let bytes = self.bytes.as_ref().ok_or_else(missing)?;
                EventPayload::Opaque(Bytes::from(bytes.0.clone()))
            }
            PayloadTag::Genesis => EventPayload::Genesis {
                network_id: self.network_id.clone().ok_or_else(missing)?,
            },
            PayloadTag::IdentityCreated => EventPayload::IdentityCreated {
                did_doc_cid: self.did_doc_cid.clone().ok_or_else(missing)?,
            },
        };
        Ok(payload)
    }

    pub fn from_payload(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Opaque(bytes) => Self::opaque(bytes.to_vec()),
            EventPayload::Genesis { network_id } => Self::genesis(network_id),
            EventPayload::IdentityCreated { did_doc_cid } => Self::identity_created(did_doc_cid),
        }
    }
}

fn body_field(tag: PayloadTag) -> &'static str {
    match tag {
        PayloadTag::Opaque => "bytes",
        PayloadTag::Genesis => "network_id",
        PayloadTag::IdentityCreated => "did_doc_cid",
    }
}

/// The logical construction of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventRecord {
    #[serde(default)]
    pub parents: Vec<EventId>,
    pub logical_time: ClockRecord,
    pub author: AuthorRecord,
    pub key_version: u64,
    pub payload: PayloadRecord,
}

impl EventRecord {
    /// A record with no parents.
    pub fn root(
        physical_ms: u64,
        logical: u64,
        author: &str,
        key_version: u64,
        payload: PayloadRecord,
    ) -> Self {
        Self {
            parents: Vec::new(),
            logical_time: ClockRecord {
                physical_ms,
                logical,
            },
            author: AuthorRecord::Text(author.to_string()),
            key_version,
            payload,
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = EventId>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }

    pub fn with_raw_author(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.author = AuthorRecord::Raw(RawAuthor {
            utf8_hex: HexBytes(bytes.into()),
        });
        self
    }

    /// Build the event this record describes.
    pub fn to_event(&self) -> Result<Event, RecordError> {
        let logical_time = HybridLogicalClock::try_from_parts(
            self.logical_time.physical_ms,
            self.logical_time.logical,
        )?;

        let author = match &self.author {
            AuthorRecord::Text(s) => Did::new(s.clone()),
            AuthorRecord::Raw(raw) => Did::from_utf8(raw.utf8_hex.0.clone())?,
        };

        let payload = self.payload.to_payload()?;

        Ok(Event::new(
            self.parents.clone(),
            logical_time,
            author,
            self.key_version,
            payload,
        ))
    }

    pub fn from_event(event: &Event) -> Self {
        let hlc = event.logical_time();
        Self {
            parents: event.parents().to_vec(),
            logical_time: ClockRecord {
                physical_ms: hlc.physical_ms,
                logical: hlc.logical.into(),
            },
            author: AuthorRecord::Text(event.author().as_str().to_string()),
            key_version: event.key_version(),
            payload: PayloadRecord::from_payload(event.payload()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_opaque_record() {
        let record: EventRecord = serde_json::from_value(json!({
            "parents": [],
            "logical_time": { "physical_ms": 1000, "logical": 0 },
            "author": "did:exo:test",
            "key_version": 1,
            "payload": { "tag": 1, "bytes": "010203" }
        }))
        .unwrap();

        let event = record.to_event().unwrap();
        assert_eq!(event.author().as_str(), "did:exo:test");
        assert_eq!(event.payload(), &EventPayload::opaque(vec![1, 2, 3]));
        assert_eq!(EventRecord::from_event(&event), record);
    }

    #[test]
    fn test_raw_author_record() {
        let record: EventRecord = serde_json::from_value(json!({
            "logical_time": { "physical_ms": 1, "logical": 0 },
            "author": { "utf8_hex": "c328" },
            "key_version": 1,
            "payload": { "tag": 1, "bytes": "" }
        }))
        .unwrap();

        match record.to_event() {
            Err(RecordError::Encoding(err)) => assert_eq!(err.kind(), "invalid_text"),
            other => panic!("expected invalid text, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_author_rejects_unknown_fields() {
        let result: Result<EventRecord, _> = serde_json::from_value(json!({
            "logical_time": { "physical_ms": 1, "logical": 0 },
            "author": { "utf8_hex": "6869", "extra": 1 },
            "key_version": 1,
            "payload": { "tag": 1, "bytes": "" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_undeclared_tag_is_encoding_error() {
        let record =
            EventRecord::root(1, 0, "did:exo:test", 1, PayloadRecord::with_tag(99, vec![1]));
        assert!(record.payload.check_shape().is_ok());
        assert_eq!(
            record.to_event().unwrap_err(),
            RecordError::Encoding(EncodingError::UndeclaredVariant { tag: 99 })
        );
    }

    #[test]
    fn test_logical_out_of_range() {
        let record =
            EventRecord::root(1, 1 << 32, "did:exo:test", 1, PayloadRecord::opaque(vec![]));
        match record.to_event() {
            Err(RecordError::Encoding(err)) => assert_eq!(err.kind(), "integer_out_of_range"),
            other => panic!("expected out of range, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_checks() {
        let missing = PayloadRecord {
            tag: 2,
            ..PayloadRecord::default()
        };
        assert_eq!(
            missing.check_shape(),
            Err(RecordError::MissingBody {
                tag: 2,
                field: "network_id"
            })
        );

        let extra = PayloadRecord {
            network_id: Some("exo".into()),
            ..PayloadRecord::opaque(vec![1])
        };
        assert_eq!(
            extra.check_shape(),
            Err(RecordError::UnexpectedBody {
                tag: 1,
                field: "network_id"
            })
        );
    }

    #[test]
    fn test_bad_hex_rejected_by_serde() {
        let result: Result<PayloadRecord, _> =
            serde_json::from_value(json!({ "tag": 1, "bytes": "xyz" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<PayloadRecord, _> =
            serde_json::from_value(json!({ "tag": 1, "bytes": "00", "colour": "red" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(PayloadRecord::genesis("exo-mainnet")).unwrap();
        assert_eq!(json, json!({ "tag": 2, "network_id": "exo-mainnet" }));
    }
}
