//! Canonical CBOR encoding for deterministic serialization.
//!
//! Events are encoded as CBOR (RFC 8949) under the Core Deterministic
//! Encoding rules, applied by hand rather than trusted to a library default:
//! - Structs are maps with text keys equal to the field names
//! - Map keys sorted by encoded byte comparison, duplicates rejected
//! - Integers use smallest valid encoding; unsigned and negative never mix
//! - Definite lengths only
//! - Payload variants are `[tag, body]` with a fixed integer tag
//! - Floats (unused by events) are always 64-bit, with a single NaN
//!
//! **CRITICAL**: This encoding is FROZEN under [`WIRE_FORMAT`]. Any change is
//! a new format with a new set of golden vectors.

use bytes::Bytes;
use ciborium::value::{Integer, Value};

use crate::error::{DecodingError, EncodingError};
use crate::event::{Event, EventPayload, PayloadTag};
use crate::hlc::HybridLogicalClock;
use crate::types::{Did, EventId};

/// Identifier of this wire format. Vector files must name it.
pub const WIRE_FORMAT: &str = "exo-event-cbor/v1";

/// The one NaN bit pattern the encoder emits.
pub const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// CBOR map key names.
mod keys {
    pub const AUTHOR: &str = "author";
    pub const KEY_VERSION: &str = "key_version";
    pub const LOGICAL_TIME: &str = "logical_time";
    pub const PARENTS: &str = "parents";
    pub const PAYLOAD: &str = "payload";

    pub const LOGICAL: &str = "logical";
    pub const PHYSICAL_MS: &str = "physical_ms";

    pub const NETWORK_ID: &str = "network_id";
    pub const DID_DOC_CID: &str = "did_doc_cid";
}

/// Turns an event into its canonical byte sequence.
pub trait CanonicalEncoder: Send + Sync {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, EncodingError>;
}

/// The reference encoder for [`WIRE_FORMAT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CborEncoder;

impl CanonicalEncoder for CborEncoder {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, EncodingError> {
        canonical_bytes(event)
    }
}

/// Encode an event to canonical CBOR bytes.
pub fn canonical_bytes(event: &Event) -> Result<Vec<u8>, EncodingError> {
    encode_value(&event_to_value(event))
}

/// Convert an event to a CBOR Value (map with text keys).
///
/// Entries are listed in declaration order; the encoder sorts them.
pub fn event_to_value(event: &Event) -> Value {
    let parents = event
        .parents()
        .iter()
        .map(|p| Value::Bytes(p.0.to_vec()))
        .collect();

    Value::Map(vec![
        (text(keys::PARENTS), Value::Array(parents)),
        (text(keys::LOGICAL_TIME), clock_to_value(event.logical_time())),
        (text(keys::AUTHOR), text(event.author().as_str())),
        (text(keys::KEY_VERSION), Value::Integer(event.key_version().into())),
        (text(keys::PAYLOAD), payload_to_value(event.payload())),
    ])
}

fn clock_to_value(hlc: HybridLogicalClock) -> Value {
    Value::Map(vec![
        (text(keys::PHYSICAL_MS), Value::Integer(hlc.physical_ms.into())),
        (text(keys::LOGICAL), Value::Integer(hlc.logical.into())),
    ])
}

fn payload_to_value(payload: &EventPayload) -> Value {
    let body = match payload {
        EventPayload::Opaque(bytes) => Value::Bytes(bytes.to_vec()),
        EventPayload::Genesis { network_id } => {
            Value::Map(vec![(text(keys::NETWORK_ID), text(network_id))])
        }
        EventPayload::IdentityCreated { did_doc_cid } => {
            Value::Map(vec![(text(keys::DID_DOC_CID), text(did_doc_cid))])
        }
    };
    Value::Array(vec![Value::Integer(payload.tag().to_u64().into()), body])
}

fn text(s: &str) -> Value {
    Value::Text(s.to_owned())
}

/// Encode any CBOR Value to canonical bytes.
///
/// Rejects duplicate map keys and CBOR tags.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), EncodingError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => encode_float(buf, *f),
        Value::Tag(..) => return Err(EncodingError::UnsupportedValue("tag")),
        _ => return Err(EncodingError::UnsupportedValue("unknown value kind")),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned argument with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a float as IEEE754 binary64 (major type 7, additional info 27).
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    let bits = if f.is_nan() { CANONICAL_NAN } else { f.to_bits() };
    buf.push(0xfb);
    buf.extend_from_slice(&bits.to_be_bytes());
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4). Order is preserved.
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), EncodingError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(
    buf: &mut Vec<u8>,
    entries: &[(Value, Value)],
) -> Result<(), EncodingError> {
    let mut key_value_pairs = entries
        .iter()
        .map(|(k, v)| encode_value(k).map(|key_bytes| (key_bytes, v)))
        .collect::<Result<Vec<_>, _>>()?;

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if key_value_pairs.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(EncodingError::DuplicateKey);
    }

    encode_uint(buf, 5, key_value_pairs.len() as u64);

    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Decode an event from canonical bytes.
///
/// Accepts exactly the bytes [`canonical_bytes`] would produce: anything
/// else (other key order, wider integers, trailing data) is rejected.
pub fn decode_event(bytes: &[u8]) -> Result<Event, DecodingError> {
    let mut reader = bytes;
    let value: Value =
        ciborium::from_reader(&mut reader).map_err(|e| DecodingError::Cbor(e.to_string()))?;

    if !reader.is_empty() {
        return Err(DecodingError::TrailingBytes(reader.len()));
    }

    let event = value_to_event(&value)?;

    if canonical_bytes(&event)? != bytes {
        return Err(DecodingError::NonCanonical);
    }

    Ok(event)
}

/// Convert a CBOR Value (map) back to an Event.
fn value_to_event(value: &Value) -> Result<Event, DecodingError> {
    let map = expect_map(value, "event", 5)?;

    let parents = match field(map, keys::PARENTS)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Bytes(b) => EventId::try_from(b.as_slice())
                    .map_err(|_| DecodingError::Malformed("parent id must be 32 bytes".into())),
                _ => Err(DecodingError::Malformed("parent id must be a byte string".into())),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(DecodingError::Malformed("parents must be an array".into())),
    };

    let clock = expect_map(field(map, keys::LOGICAL_TIME)?, "logical_time", 2)?;
    let logical_time = HybridLogicalClock::try_from_parts(
        expect_u64(field(clock, keys::PHYSICAL_MS)?, keys::PHYSICAL_MS)?,
        expect_u64(field(clock, keys::LOGICAL)?, keys::LOGICAL)?,
    )?;

    let author = match field(map, keys::AUTHOR)? {
        Value::Text(s) => Did::new(s.clone()),
        _ => return Err(DecodingError::Malformed("author must be a text string".into())),
    };

    let key_version = expect_u64(field(map, keys::KEY_VERSION)?, keys::KEY_VERSION)?;
    let payload = value_to_payload(field(map, keys::PAYLOAD)?)?;

    Ok(Event::new(parents, logical_time, author, key_version, payload))
}

fn value_to_payload(value: &Value) -> Result<EventPayload, DecodingError> {
    let (tag, body) = match value {
        Value::Array(items) if items.len() == 2 => (&items[0], &items[1]),
        _ => return Err(DecodingError::Malformed("payload must be [tag, body]".into())),
    };

    let tag = PayloadTag::try_from(expect_u64(tag, "payload tag")?)?;

    let payload = match tag {
        PayloadTag::Opaque => match body {
            Value::Bytes(b) => EventPayload::Opaque(Bytes::from(b.clone())),
            _ => return Err(DecodingError::Malformed("opaque body must be bytes".into())),
        },
        PayloadTag::Genesis => EventPayload::Genesis {
            network_id: expect_text_field(body, keys::NETWORK_ID)?,
        },
        PayloadTag::IdentityCreated => EventPayload::IdentityCreated {
            did_doc_cid: expect_text_field(body, keys::DID_DOC_CID)?,
        },
    };
    Ok(payload)
}

fn expect_map<'a>(
    value: &'a Value,
    what: &str,
    len: usize,
) -> Result<&'a [(Value, Value)], DecodingError> {
    match value {
        Value::Map(entries) if entries.len() == len => Ok(entries),
        Value::Map(entries) => Err(DecodingError::Malformed(format!(
            "{} must have {} fields, found {}",
            what,
            len,
            entries.len()
        ))),
        _ => Err(DecodingError::Malformed(format!("{} must be a map", what))),
    }
}

fn field<'a>(entries: &'a [(Value, Value)], key: &str) -> Result<&'a Value, DecodingError> {
    entries
        .iter()
        .find(|(k, _)| matches!(k, Value::Text(t) if t == key))
        .map(|(_, v)| v)
        .ok_or_else(|| DecodingError::Malformed(format!("missing field {}", key)))
}

fn expect_u64(value: &Value, what: &str) -> Result<u64, DecodingError> {
    match value {
        Value::Integer(i) => u64::try_from(*i)
            .map_err(|_| DecodingError::Malformed(format!("{} must be unsigned", what))),
        _ => Err(DecodingError::Malformed(format!("{} must be an integer", what))),
    }
}

fn expect_text_field(body: &Value, key: &str) -> Result<String, DecodingError> {
    match field(expect_map(body, "payload body", 1)?, key)? {
        Value::Text(s) => Ok(s.clone()),
        _ => Err(DecodingError::Malformed(format!("{} must be a text string", key))),
    }
}
