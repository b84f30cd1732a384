//! Binary serialization and deserialization of condition sets.
//!
//! Parsing every course's rule is done once at data-refresh time; this module
//! persists the resulting [`ConditionSet`](crate::ConditionSet) so services
//! can load it without re-parsing. The format consists of a 32-byte fixed
//! header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"PREQ"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parse::ParseError;
use crate::{Condition, ConditionSet};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"PREQ";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`ConditionSet`](crate::ConditionSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode condition set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`ConditionSet`](crate::ConditionSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a prereq binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedConditionSet {
    metadata: ConditionSetMetadata,
    conditions: Vec<(String, Option<Condition>)>,
    failures: Vec<(String, ParseError)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConditionSetMetadata {
    course_count: usize,
    failure_count: usize,
    source_digest: Option<[u8; 32]>,
}

fn set_to_serialized(set: &ConditionSet, source_text: Option<&str>) -> SerializedConditionSet {
    SerializedConditionSet {
        metadata: ConditionSetMetadata {
            course_count: set.conditions.len(),
            failure_count: set.failures.len(),
            source_digest: source_text.map(|text| *blake3::hash(text.as_bytes()).as_bytes()),
        },
        conditions: set
            .conditions
            .iter()
            .map(|(course, condition)| (course.clone(), condition.clone()))
            .collect(),
        failures: set
            .failures
            .iter()
            .map(|(course, err)| (course.clone(), err.clone()))
            .collect(),
    }
}

fn serialized_to_set(ser: SerializedConditionSet) -> ConditionSet {
    ConditionSet {
        conditions: ser.conditions.into_iter().collect(),
        failures: ser.failures.into_iter().collect(),
        directory: None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedConditionSet) -> Result<(), DeserializeError> {
    if ser.metadata.course_count != ser.conditions.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} courses but payload has {}",
            ser.metadata.course_count,
            ser.conditions.len()
        )));
    }
    if ser.metadata.failure_count != ser.failures.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} failures but payload has {}",
            ser.metadata.failure_count,
            ser.failures.len()
        )));
    }

    let mut courses = BTreeMap::new();
    for (course, condition) in &ser.conditions {
        if courses.insert(course.as_str(), condition.is_some()).is_some() {
            return Err(DeserializeError::Validation(format!(
                "course '{course}' appears more than once"
            )));
        }
    }

    // every failure must belong to a course stored without a tree
    for (course, _) in &ser.failures {
        match courses.get(course.as_str()) {
            None => {
                return Err(DeserializeError::Validation(format!(
                    "parse failure recorded for unknown course '{course}'"
                )));
            }
            Some(true) => {
                return Err(DeserializeError::Validation(format!(
                    "course '{course}' has both a condition and a parse failure"
                )));
            }
            Some(false) => {}
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

/// The BLAKE3 digest of the source text stored in a blob, if any.
///
/// Only the header and payload are checked; use this to decide whether a
/// cache built from older rule data should be rebuilt.
///
/// # Errors
///
/// Returns [`DeserializeError`] if the blob is malformed.
pub fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    let serialized = decode_payload(bytes)?;
    Ok(serialized.metadata.source_digest)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    set: &ConditionSet,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = set_to_serialized(set, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn decode_payload(bytes: &[u8]) -> Result<SerializedConditionSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedConditionSet, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<ConditionSet, DeserializeError> {
    let serialized = decode_payload(bytes)?;
    validate(&serialized)?;
    Ok(serialized_to_set(serialized))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseErrorKind;

    fn metadata(course_count: usize, failure_count: usize) -> ConditionSetMetadata {
        ConditionSetMetadata {
            course_count,
            failure_count,
            source_digest: None,
        }
    }

    fn failure() -> ParseError {
        ParseError {
            position: 1,
            kind: ParseErrorKind::UnclosedBracket,
        }
    }

    #[test]
    fn header_round_trip() {
        let payload = b"test payload data";
        let mut buf = Vec::new();
        write_header(&mut buf, payload);
        assert_eq!(buf.len(), HEADER_SIZE);

        let (format_version, payload_len, hash) = read_header(&buf).unwrap();
        assert_eq!(format_version, FORMAT_VERSION);
        assert_eq!(payload_len as usize, payload.len());

        let expected_hash = blake3::hash(payload);
        assert_eq!(&hash, &expected_hash.as_bytes()[..16]);
    }

    #[test]
    fn header_bad_magic() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"BAAD");
        assert!(matches!(read_header(&buf), Err(DeserializeError::BadMagic)));
    }

    #[test]
    fn header_too_short() {
        let buf = vec![0u8; 10];
        assert!(matches!(
            read_header(&buf),
            Err(DeserializeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn validate_count_mismatch() {
        let ser = SerializedConditionSet {
            metadata: metadata(2, 0),
            conditions: vec![("COMP1511".into(), None)],
            failures: vec![],
        };
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_duplicate_course() {
        let ser = SerializedConditionSet {
            metadata: metadata(2, 0),
            conditions: vec![("COMP1511".into(), None), ("COMP1511".into(), None)],
            failures: vec![],
        };
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_failure_for_unknown_course() {
        let ser = SerializedConditionSet {
            metadata: metadata(0, 1),
            conditions: vec![],
            failures: vec![("COMP1511".into(), failure())],
        };
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_failure_with_tree() {
        let ser = SerializedConditionSet {
            metadata: metadata(1, 1),
            conditions: vec![("COMP2521".into(), Some(Condition::course("COMP1511")))],
            failures: vec![("COMP2521".into(), failure())],
        };
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_accepts_consistent_payload() {
        let ser = SerializedConditionSet {
            metadata: metadata(2, 1),
            conditions: vec![
                ("COMP2521".into(), Some(Condition::course("COMP1511"))),
                ("COMP9999".into(), None),
            ],
            failures: vec![("COMP9999".into(), failure())],
        };
        assert!(validate(&ser).is_ok());
    }
}
