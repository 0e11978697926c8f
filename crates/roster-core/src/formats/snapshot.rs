//! Snapshot format: `RSTR` magic, one version byte, postcard payload.

use crate::error::RegistryError;
use crate::person::Person;
use serde::{Deserialize, Serialize};

/// File signature.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"RSTR";

/// Current payload version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = SNAPSHOT_MAGIC.len() + 1;

/// Full contents of a file-backed registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Next id to assign. Kept so deleted ids are never reused.
    pub next_id: u64,
    /// Records in id order.
    pub people: Vec<Person>,
}

pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, RegistryError> {
    let payload = postcard::to_allocvec(snapshot)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SNAPSHOT_MAGIC);
    bytes.push(SNAPSHOT_VERSION);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, RegistryError> {
    let Some((header, payload)) = bytes.split_at_checked(HEADER_LEN) else {
        return Err(RegistryError::Snapshot("file too short".into()));
    };
    if header[..SNAPSHOT_MAGIC.len()] != SNAPSHOT_MAGIC {
        return Err(RegistryError::Snapshot("not a roster snapshot".into()));
    }
    let version = header[SNAPSHOT_MAGIC.len()];
    if version != SNAPSHOT_VERSION {
        return Err(RegistryError::Snapshot(format!(
            "unsupported snapshot version {version}"
        )));
    }
    postcard::from_bytes(payload).map_err(|e| RegistryError::Snapshot(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, PersonStore, contract};

    fn sample() -> Snapshot {
        let mut store = MemoryStore::new();
        store
            .insert(contract::new_person("júlia", "48195027633"), contract::now())
            .unwrap();
        store
            .insert(contract::new_person("ana", "11111111111"), contract::now())
            .unwrap();
        store.snapshot()
    }

    #[test]
    fn snapshot_round_trip() {
        let snapshot = sample();
        let bytes = encode_snapshot(&snapshot).unwrap();
        assert_eq!(&bytes[..4], b"RSTR");
        assert_eq!(bytes[4], SNAPSHOT_VERSION);
        assert_eq!(decode_snapshot(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn encoding_is_deterministic() {
        let snapshot = sample();
        assert_eq!(
            encode_snapshot(&snapshot).unwrap(),
            encode_snapshot(&snapshot).unwrap()
        );
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(decode_snapshot(b"RS"), Err(RegistryError::Snapshot(_))));
        assert!(matches!(decode_snapshot(b"XXXX\x01"), Err(RegistryError::Snapshot(_))));

        let mut bytes = encode_snapshot(&sample()).unwrap();
        bytes[4] = 99;
        assert!(matches!(decode_snapshot(&bytes), Err(RegistryError::Snapshot(_))));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = encode_snapshot(&sample()).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(decode_snapshot(cut).is_err());
    }

    #[test]
    fn empty_snapshot_round_trip() {
        let bytes = encode_snapshot(&Snapshot::default()).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), Snapshot::default());
    }
}
