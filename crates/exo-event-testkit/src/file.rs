//! JSON vector files.
//!
//! A vector file is the language-neutral form of a [`Registry`]. Other
//! implementations read the same file to check that they agree with this
//! one byte for byte.

use std::io;
use std::path::{Path, PathBuf};

use exo_event_core::{HASH_ALGORITHM, WIRE_FORMAT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::EventRecord;
use crate::vectors::{Expectation, GoldenVector, Registry, RegistryError, VectorStatus};

/// Rejection kinds a vector may name in `expected_error`.
pub const REJECTION_KINDS: &[&str] = &[
    "undeclared_variant",
    "integer_out_of_range",
    "invalid_text",
    "duplicate_key",
    "unsupported_value",
];

/// A vector file that cannot be used.
#[derive(Debug, Error)]
pub enum VectorFormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported wire format `{0}`")]
    UnsupportedFormat(String),

    #[error("unsupported hash algorithm `{0}`")]
    UnsupportedHash(String),

    #[error("vector `{id}`: {reason}")]
    Vector { id: String, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl VectorFormatError {
    fn vector(id: &str, reason: impl Into<String>) -> Self {
        Self::Vector {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors loading a vector file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read at all.
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was read but is not a usable vector file.
    #[error("{}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: VectorFormatError,
    },
}

/// On-disk layout of a vector file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorFile {
    pub format: String,
    pub hash: String,
    #[serde(default)]
    pub description: String,
    pub vectors: Vec<VectorRecord>,
}

/// On-disk layout of a single vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorRecord {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub event: EventRecord,
    #[serde(default)]
    pub expected_canonical_hex: Option<String>,
    #[serde(default)]
    pub expected_digest: Option<String>,
    #[serde(default)]
    pub expected_error: Option<String>,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub superseded_reason: Option<String>,
}

impl VectorRecord {
    fn into_vector(self) -> Result<GoldenVector, VectorFormatError> {
        let id = self.id;
        if id.is_empty() {
            return Err(VectorFormatError::vector(&id, "empty id"));
        }

        self.event
            .payload
            .check_shape()
            .map_err(|e| VectorFormatError::vector(&id, e.to_string()))?;

        let mut vector = match (self.expected_digest, self.expected_error) {
            (Some(digest), None) => {
                if !is_lower_hex(&digest) || digest.len() != 64 {
                    return Err(VectorFormatError::vector(
                        &id,
                        "expected_digest must be 64 lowercase hex characters",
                    ));
                }
                GoldenVector::digest(id.clone(), self.description, self.event, digest)
            }
            (None, Some(kind)) => {
                if !REJECTION_KINDS.contains(&kind.as_str()) {
                    return Err(VectorFormatError::vector(
                        &id,
                        format!("unknown rejection kind `{}`", kind),
                    ));
                }
                GoldenVector::rejection(id.clone(), self.description, self.event, kind)
            }
            (Some(_), Some(_)) => {
                return Err(VectorFormatError::vector(
                    &id,
                    "expected_digest and expected_error are mutually exclusive",
                ))
            }
            (None, None) => {
                return Err(VectorFormatError::vector(
                    &id,
                    "one of expected_digest or expected_error is required",
                ))
            }
        };

        if let Some(canonical) = self.expected_canonical_hex {
            if !is_lower_hex(&canonical) || canonical.len() % 2 != 0 {
                return Err(VectorFormatError::vector(
                    &id,
                    "expected_canonical_hex must be lowercase hex",
                ));
            }
            if matches!(vector.expectation, Expectation::Rejection(_)) {
                return Err(VectorFormatError::vector(
                    &id,
                    "a rejection vector has no canonical bytes",
                ));
            }
            vector = vector.with_canonical(canonical);
        }

        match (self.superseded_by, self.superseded_reason) {
            (Some(by), reason) => Ok(vector.with_status(VectorStatus::Superseded {
                by,
                reason: reason.unwrap_or_default(),
            })),
            (None, Some(_)) => Err(VectorFormatError::vector(
                &id,
                "superseded_reason without superseded_by",
            )),
            (None, None) => Ok(vector),
        }
    }

    fn from_vector(vector: &GoldenVector) -> Self {
        let (expected_digest, expected_error) = match &vector.expectation {
            Expectation::Digest(digest) => (Some(digest.clone()), None),
            Expectation::Rejection(kind) => (None, Some(kind.clone())),
        };
        let (superseded_by, superseded_reason) = match vector.status() {
            VectorStatus::Active => (None, None),
            VectorStatus::Superseded { by, reason } => (Some(by.clone()), Some(reason.clone())),
        };
        Self {
            id: vector.id.clone(),
            description: vector.description.clone(),
            event: vector.event.clone(),
            expected_canonical_hex: vector.expected_canonical.clone(),
            expected_digest,
            expected_error,
            superseded_by,
            superseded_reason,
        }
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl VectorFile {
    pub fn from_registry(registry: &Registry, description: impl Into<String>) -> Self {
        Self {
            format: registry.format().to_string(),
            hash: HASH_ALGORITHM.to_string(),
            description: description.into(),
            vectors: registry.vectors().iter().map(VectorRecord::from_vector).collect(),
        }
    }

    pub fn into_registry(self) -> Result<Registry, VectorFormatError> {
        if self.format != WIRE_FORMAT {
            return Err(VectorFormatError::UnsupportedFormat(self.format));
        }
        if self.hash != HASH_ALGORITHM {
            return Err(VectorFormatError::UnsupportedHash(self.hash));
        }
        let vectors = self
            .vectors
            .into_iter()
            .map(VectorRecord::into_vector)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Registry::from_published(self.format, vectors)?)
    }
}

/// Parse a vector file from JSON text.
pub fn parse_vector_file(json: &str) -> Result<Registry, VectorFormatError> {
    parse_vector_bytes(json.as_bytes())
}

/// Parse vector file contents straight from disk. Invalid UTF-8 is a JSON error.
fn parse_vector_bytes(bytes: &[u8]) -> Result<Registry, VectorFormatError> {
    let file: VectorFile = serde_json::from_slice(bytes)?;
    file.into_registry()
}

/// Read and parse a vector file.
pub fn load_vector_file(path: impl AsRef<Path>) -> Result<Registry, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = parse_vector_bytes(&bytes).map_err(|source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), vectors = registry.len(), "loaded vector file");
    Ok(registry)
}

/// Render a registry as pretty-printed vector file JSON.
pub fn to_json(registry: &Registry, description: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&VectorFile::from_registry(registry, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::builtin_registry;
    use exo_event_core::EncodingError;
    use serde_json::json;

    fn file_with(vector: serde_json::Value) -> String {
        json!({
            "format": "exo-event-cbor/v1",
            "hash": "blake3-256",
            "vectors": [vector]
        })
        .to_string()
    }

    fn simple_event() -> serde_json::Value {
        json!({
            "parents": [],
            "logical_time": { "physical_ms": 1000, "logical": 0 },
            "author": "did:exo:test",
            "key_version": 1,
            "payload": { "tag": 1, "bytes": "010203" }
        })
    }

    #[test]
    fn test_rejection_kinds_cover_encoding_errors() {
        let errors = [
            EncodingError::UndeclaredVariant { tag: 0 },
            EncodingError::IntegerOutOfRange {
                field: "logical",
                value: 0,
            },
            EncodingError::InvalidText {
                field: "author",
                reason: String::new(),
            },
            EncodingError::DuplicateKey,
            EncodingError::UnsupportedValue("tag"),
        ];
        for err in errors {
            assert!(REJECTION_KINDS.contains(&err.kind()), "{}", err.kind());
        }
    }

    #[test]
    fn test_builtin_survives_json() {
        let registry = builtin_registry();
        let json = to_json(&registry, "reference vectors").unwrap();
        assert_eq!(parse_vector_file(&json).unwrap(), registry);
    }

    #[test]
    fn test_parse_minimal_vector() {
        let registry = parse_vector_file(&file_with(json!({
            "id": "simple",
            "event": simple_event(),
            "expected_digest": "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07"
        })))
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.get("simple").unwrap().is_superseded());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let json = json!({ "format": "exo-event-cbor/v9", "hash": "blake3-256", "vectors": [] });
        assert!(matches!(
            parse_vector_file(&json.to_string()),
            Err(VectorFormatError::UnsupportedFormat(f)) if f == "exo-event-cbor/v9"
        ));

        let json = json!({ "format": "exo-event-cbor/v1", "hash": "sha-256", "vectors": [] });
        assert!(matches!(
            parse_vector_file(&json.to_string()),
            Err(VectorFormatError::UnsupportedHash(_))
        ));
    }

    #[test]
    fn test_rejects_contradictory_expectations() {
        let err = parse_vector_file(&file_with(json!({
            "id": "both",
            "event": simple_event(),
            "expected_digest": "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07",
            "expected_error": "invalid_text"
        })))
        .unwrap_err();
        assert!(matches!(err, VectorFormatError::Vector { id, .. } if id == "both"));

        let err = parse_vector_file(&file_with(json!({
            "id": "neither",
            "event": simple_event()
        })))
        .unwrap_err();
        assert!(matches!(err, VectorFormatError::Vector { id, .. } if id == "neither"));
    }

    #[test]
    fn test_rejects_bad_digest_and_kind() {
        let err = parse_vector_file(&file_with(json!({
            "id": "upper",
            "event": simple_event(),
            "expected_digest": "5AB9FBFBC89020BBB1A216780FBC6605CEEE149B1A7D3A94D657A71C4A1EBD07"
        })))
        .unwrap_err();
        assert!(matches!(err, VectorFormatError::Vector { .. }));

        let err = parse_vector_file(&file_with(json!({
            "id": "kind",
            "event": simple_event(),
            "expected_error": "too_spicy"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("too_spicy"));
    }

    #[test]
    fn test_rejects_bad_payload_shape() {
        let mut event = simple_event();
        event["payload"] = json!({ "tag": 2, "bytes": "00" });
        let err = parse_vector_file(&file_with(json!({
            "id": "shape",
            "event": event,
            "expected_error": "undeclared_variant"
        })))
        .unwrap_err();
        assert!(matches!(err, VectorFormatError::Vector { id, .. } if id == "shape"));
    }

    #[test]
    fn test_undeclared_tag_is_not_a_format_error() {
        let mut event = simple_event();
        event["payload"] = json!({ "tag": 99, "bytes": "00" });
        let registry = parse_vector_file(&file_with(json!({
            "id": "tag99",
            "event": event,
            "expected_error": "undeclared_variant"
        })))
        .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rejects_bad_parent_hex() {
        let mut event = simple_event();
        event["parents"] = json!(["abcd"]);
        assert!(matches!(
            parse_vector_file(&file_with(json!({
                "id": "parent",
                "event": event,
                "expected_error": "invalid_text"
            }))),
            Err(VectorFormatError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_dangling_supersede() {
        let err = parse_vector_file(&file_with(json!({
            "id": "old",
            "event": simple_event(),
            "expected_digest": "5ab9fbfbc89020bbb1a216780fbc6605ceee149b1a7d3a94d657a71c4a1ebd07",
            "superseded_by": "new"
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            VectorFormatError::Registry(RegistryError::UnknownVector(id)) if id == "new"
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let vector = json!({
            "id": "twice",
            "event": simple_event(),
            "expected_error": "invalid_text"
        });
        let json = json!({
            "format": "exo-event-cbor/v1",
            "hash": "blake3-256",
            "vectors": [vector.clone(), vector]
        });
        assert!(matches!(
            parse_vector_file(&json.to_string()),
            Err(VectorFormatError::Registry(RegistryError::DuplicateId(_)))
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_vector_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_vector_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Format { .. }));
        assert!(err.to_string().starts_with(&path.display().to_string()));
    }

    #[test]
    fn test_load_non_utf8_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        std::fs::write(&path, [0xff, 0xfe, b'{']).unwrap();
        let err = load_vector_file(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format {
                source: VectorFormatError::Json(_),
                ..
            }
        ));
    }

    #[test]
    fn test_load_error_message_omits_cause() {
        use std::error::Error as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_vector_file(&path).unwrap_err();
        assert_eq!(err.to_string(), format!("cannot read {}", path.display()));
        assert!(err.source().is_some());
    }
}
