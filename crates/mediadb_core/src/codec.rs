//! CBOR record serialization.
//!
//! The wire format is self-describing CBOR via serde; field names and
//! types round-trip, which is all the engine requires of it.

use crate::error::{EngineError, EngineResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes a record to CBOR bytes.
pub fn to_vec<T: Serialize>(value: &T) -> EngineResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(EngineError::marshal)?;
    Ok(buf)
}

/// Deserializes a record from CBOR bytes.
pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> EngineResult<T> {
    ciborium::de::from_reader(bytes).map_err(EngineError::unmarshal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u64,
        tags: Vec<String>,
    }

    #[test]
    fn roundtrip() {
        let sample = Sample {
            name: "cowboy bebop".into(),
            count: 26,
            tags: vec!["space".into(), "jazz".into()],
        };
        let bytes = to_vec(&sample).unwrap();
        let back: Sample = from_slice(&bytes).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn garbage_fails_unmarshal() {
        let result: EngineResult<Sample> = from_slice(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(EngineError::Unmarshal { .. })));
    }
}
