//! Journal record types and frame encoding.
//!
//! Every journal entry is one frame: a 4-byte little-endian payload
//! length, a 4-byte CRC32 of the payload, then the CBOR payload. A
//! commit is a single frame, so a crash mid-write leaves at most one
//! torn frame at the tail, which replay discards.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Frame header size: payload length + checksum.
const FRAME_HEADER: usize = 8;

/// A single write inside a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOp {
    /// Bucket index the write applies to.
    pub bucket: u32,
    /// Key bytes.
    pub key: Vec<u8>,
    /// New value, or `None` for a deletion.
    pub value: Option<Vec<u8>>,
}

/// A journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalRecord {
    /// Declares new buckets, indexed in order of first appearance.
    Buckets {
        /// Names of the buckets being created.
        names: Vec<String>,
    },
    /// An atomically committed batch of writes.
    Commit {
        /// Commit sequence number.
        seq: u64,
        /// Final per-bucket sequence counters drawn by this commit.
        sequences: Vec<(u32, u64)>,
        /// Writes applied by this commit, in (bucket, key) order.
        writes: Vec<WriteOp>,
    },
}

/// Encodes a record into a length- and checksum-prefixed frame.
pub fn encode_frame(record: &JournalRecord) -> StoreResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::ser::into_writer(record, &mut payload)
        .map_err(|e| StoreError::corrupted(format!("failed to encode journal record: {e}")))?;

    let mut frame = Vec::with_capacity(FRAME_HEADER + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decodes all frames in a journal image.
///
/// A truncated or checksum-failing frame at the very end of the image is
/// treated as a torn write and discarded; the same damage anywhere else
/// is a [`StoreError::Corrupted`].
pub fn decode_frames(bytes: &[u8]) -> StoreResult<Vec<JournalRecord>> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    while offset < bytes.len() {
        let remaining = bytes.len() - offset;
        if remaining < FRAME_HEADER {
            warn!(trailing = remaining, "discarding torn journal tail");
            break;
        }

        let mut header = [0u8; 4];
        header.copy_from_slice(&bytes[offset..offset + 4]);
        let len = u32::from_le_bytes(header) as usize;
        header.copy_from_slice(&bytes[offset + 4..offset + 8]);
        let stored_crc = u32::from_le_bytes(header);

        let payload_start = offset + FRAME_HEADER;
        let payload_end = payload_start + len;
        if payload_end > bytes.len() {
            warn!(
                trailing = remaining,
                "discarding torn journal frame at offset {offset}"
            );
            break;
        }

        let payload = &bytes[payload_start..payload_end];
        if crc32fast::hash(payload) != stored_crc {
            if payload_end == bytes.len() {
                warn!("discarding checksum-failing journal frame at tail");
                break;
            }
            return Err(StoreError::corrupted(format!(
                "checksum mismatch at offset {offset}"
            )));
        }

        let record: JournalRecord = ciborium::de::from_reader(payload)
            .map_err(|e| StoreError::corrupted(format!("undecodable record at {offset}: {e}")))?;
        records.push(record);
        offset = payload_end;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(seq: u64) -> JournalRecord {
        JournalRecord::Commit {
            seq,
            sequences: vec![(0, seq)],
            writes: vec![WriteOp {
                bucket: 0,
                key: seq.to_be_bytes().to_vec(),
                value: Some(vec![1, 2, 3]),
            }],
        }
    }

    #[test]
    fn frame_roundtrip() {
        let records = vec![
            JournalRecord::Buckets {
                names: vec!["media".into(), "users".into()],
            },
            commit(1),
            commit(2),
        ];

        let mut image = Vec::new();
        for record in &records {
            image.extend(encode_frame(record).unwrap());
        }

        assert_eq!(decode_frames(&image).unwrap(), records);
    }

    #[test]
    fn torn_tail_is_discarded() {
        let mut image = encode_frame(&commit(1)).unwrap();
        let tail = encode_frame(&commit(2)).unwrap();
        image.extend_from_slice(&tail[..tail.len() / 2]);

        let records = decode_frames(&image).unwrap();
        assert_eq!(records, vec![commit(1)]);
    }

    #[test]
    fn torn_header_is_discarded() {
        let mut image = encode_frame(&commit(1)).unwrap();
        image.extend_from_slice(&[0xAB, 0xCD]);

        let records = decode_frames(&image).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn mid_journal_corruption_is_an_error() {
        let mut image = encode_frame(&commit(1)).unwrap();
        let flip_at = image.len() - 1;
        image[flip_at] ^= 0xFF;
        image.extend(encode_frame(&commit(2)).unwrap());

        let result = decode_frames(&image);
        assert!(matches!(result, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn checksum_failure_at_tail_is_discarded() {
        let mut image = encode_frame(&commit(1)).unwrap();
        let good = image.len();
        image.extend(encode_frame(&commit(2)).unwrap());
        let flip_at = image.len() - 1;
        image[flip_at] ^= 0xFF;

        let records = decode_frames(&image).unwrap();
        assert_eq!(records, vec![commit(1)]);
        assert!(good < image.len());
    }

    #[test]
    fn empty_image_decodes_to_nothing() {
        assert!(decode_frames(&[]).unwrap().is_empty());
    }
}
