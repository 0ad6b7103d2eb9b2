//! Strong type definitions for the event log.
//!
//! Identifiers are newtypes so a digest can never be confused with arbitrary
//! bytes, and an author can never be confused with arbitrary text.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::EncodingError;

/// Length of an event identifier in bytes.
pub const EVENT_ID_LEN: usize = 32;

/// A 32-byte event identifier, computed as Blake3(canonical_bytes(event)).
///
/// This is the content-address of an event. It is never stored inside the
/// event it names; other events refer to it through their `parents` list.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub [u8; EVENT_ID_LEN]);

impl EventId {
    /// Create a new EventId from raw bytes.
    pub const fn from_bytes(bytes: [u8; EVENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; EVENT_ID_LEN] {
        &self.0
    }

    /// Convert to the interchange form: 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != EVENT_ID_LEN {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; EVENT_ID_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero event ID (used as a sentinel).
    pub const ZERO: Self = Self([0u8; EVENT_ID_LEN]);
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for EventId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; EVENT_ID_LEN]> for EventId {
    fn from(bytes: [u8; EVENT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for EventId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; EVENT_ID_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(D::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::try_from(bytes.as_slice())
                .map_err(|_| D::Error::custom("event id must be 32 bytes"))
        }
    }
}

/// A decentralized identifier naming the author of an event.
///
/// The encoder treats it as opaque UTF-8 text; resolving or verifying it is
/// the identity layer's job.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Did(String);

impl Did {
    /// Wrap an identity string.
    pub fn new(did: impl Into<String>) -> Self {
        Self(did.into())
    }

    /// Build from raw bytes, which must be valid UTF-8.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, EncodingError> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|e| EncodingError::InvalidText {
                field: "author",
                reason: e.utf8_error().to_string(),
            })
    }

    /// Get the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Did {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Did {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_hex_roundtrip() {
        let id = EventId::from_bytes([0x42; 32]);
        let hex = id.to_hex();
        let recovered = EventId::from_hex(&hex).unwrap();
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_event_id_display_is_full_lowercase_hex() {
        let id = EventId::from_bytes([0xab; 32]);
        let display = format!("{}", id);
        assert_eq!(display.len(), 64);
        assert_eq!(display, "ab".repeat(32));
    }

    #[test]
    fn test_event_id_debug() {
        let id = EventId::from_bytes([0xcd; 32]);
        let debug = format!("{:?}", id);
        assert_eq!(debug, "EventId(cdcdcdcdcdcdcdcd)");
    }

    #[test]
    fn test_event_id_rejects_wrong_length() {
        assert!(EventId::from_hex("abcd").is_err());
        assert!(EventId::from_hex(&"00".repeat(33)).is_err());
        assert!(EventId::from_hex("zz").is_err());
    }

    #[test]
    fn test_event_id_json_is_hex_string() {
        let id = EventId::from_bytes([0x01; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));

        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_did_from_utf8() {
        let did = Did::from_utf8("did:exo:zoë".as_bytes().to_vec()).unwrap();
        assert_eq!(did.as_str(), "did:exo:zoë");

        let err = Did::from_utf8(vec![0xc3, 0x28]).unwrap_err();
        assert_eq!(err.kind(), "invalid_text");
    }
}
