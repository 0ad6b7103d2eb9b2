//! Error types for the event core.

use thiserror::Error;

/// An input value violates the canonical schema.
///
/// Encoding never substitutes a default; every violation is surfaced here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("undeclared payload variant tag {tag}")]
    UndeclaredVariant { tag: u64 },

    #[error("{field} value {value} is out of range")]
    IntegerOutOfRange { field: &'static str, value: u128 },

    #[error("{field} is not valid UTF-8: {reason}")]
    InvalidText { field: &'static str, reason: String },

    #[error("duplicate map key in canonical value")]
    DuplicateKey,

    #[error("unsupported value in canonical encoding: {0}")]
    UnsupportedValue(&'static str),
}

impl EncodingError {
    /// Stable, language-neutral name of this failure.
    ///
    /// Vector files refer to rejections by these names.
    pub fn kind(&self) -> &'static str {
        match self {
            EncodingError::UndeclaredVariant { .. } => "undeclared_variant",
            EncodingError::IntegerOutOfRange { .. } => "integer_out_of_range",
            EncodingError::InvalidText { .. } => "invalid_text",
            EncodingError::DuplicateKey => "duplicate_key",
            EncodingError::UnsupportedValue(_) => "unsupported_value",
        }
    }
}

/// Errors from parsing canonical bytes back into an event.
#[derive(Debug, Error)]
pub enum DecodingError {
    #[error("invalid CBOR: {0}")]
    Cbor(String),

    #[error("malformed event: {0}")]
    Malformed(String),

    #[error("{0} trailing bytes after event")]
    TrailingBytes(usize),

    #[error("bytes are valid CBOR but not in canonical form")]
    NonCanonical,

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            EncodingError::UndeclaredVariant { tag: 9 },
            EncodingError::IntegerOutOfRange {
                field: "logical",
                value: 1 << 40,
            },
            EncodingError::InvalidText {
                field: "author",
                reason: "bad".into(),
            },
            EncodingError::DuplicateKey,
            EncodingError::UnsupportedValue("tag"),
        ];
        let mut kinds: Vec<_> = errors.iter().map(EncodingError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_display() {
        let err = EncodingError::IntegerOutOfRange {
            field: "logical",
            value: 4_294_967_296,
        };
        assert_eq!(err.to_string(), "logical value 4294967296 is out of range");
    }
}
