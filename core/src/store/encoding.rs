//! Binary snapshot encoding for the store
//!
//! Layout: a fixed 24-byte header followed by the bincode payload.
//!
//! ```text
//! [magic "JRSS"][version u32][payload_len u64][xxh3 u64][payload ...]
//! ```
//!
//! Restoring never falls back to defaults. Anything short of a well-formed,
//! checksum-valid payload is an error the rollback coordinator must see.

use bytemuck::{Pod, Zeroable};
use xxhash_rust::xxh3::xxh3_64;

use super::ScriptStore;

pub const STORE_MAGIC: [u8; 4] = *b"JRSS";
pub const STORE_VERSION: u32 = 1;

/// Size of the encoded header in bytes
pub const STORE_HEADER_SIZE: usize = std::mem::size_of::<StoreHeader>();

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct StoreHeader {
    magic: [u8; 4],
    version: u32,
    payload_len: u64,
    checksum: u64,
}

/// Store encode/restore failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store snapshot truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("store snapshot has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("not a store snapshot (magic {0:?})")]
    BadMagic([u8; 4]),

    #[error("unsupported store snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("store snapshot checksum mismatch: header {expected:#x}, payload {actual:#x}")]
    ChecksumMismatch { expected: u64, actual: u64 },

    #[error("failed to decode store snapshot: {0}")]
    Decode(#[source] bincode::Error),

    #[error("failed to encode store: {0}")]
    Encode(#[source] bincode::Error),
}

impl ScriptStore {
    /// Encode the whole store
    pub fn serialize(&self) -> Result<Vec<u8>, StoreError> {
        let mut buffer = Vec::new();
        self.serialize_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Encode the whole store into `buffer`, replacing its contents
    ///
    /// Lets callers reuse snapshot buffers across frames.
    pub fn serialize_into(&self, buffer: &mut Vec<u8>) -> Result<(), StoreError> {
        buffer.clear();
        buffer.resize(STORE_HEADER_SIZE, 0);
        bincode::serialize_into(&mut *buffer, self).map_err(StoreError::Encode)?;

        let payload = &buffer[STORE_HEADER_SIZE..];
        let header = StoreHeader {
            magic: STORE_MAGIC,
            version: STORE_VERSION,
            payload_len: payload.len() as u64,
            checksum: xxh3_64(payload),
        };
        buffer[..STORE_HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        Ok(())
    }

    /// Decode a store from bytes produced by [`serialize`](Self::serialize)
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < STORE_HEADER_SIZE {
            return Err(StoreError::Truncated {
                expected: STORE_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let header: StoreHeader = bytemuck::pod_read_unaligned(&bytes[..STORE_HEADER_SIZE]);
        if header.magic != STORE_MAGIC {
            return Err(StoreError::BadMagic(header.magic));
        }
        if header.version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion(header.version));
        }

        let payload = &bytes[STORE_HEADER_SIZE..];
        let expected = usize::try_from(header.payload_len).unwrap_or(usize::MAX);
        if payload.len() < expected {
            return Err(StoreError::Truncated {
                expected: STORE_HEADER_SIZE.saturating_add(expected),
                actual: bytes.len(),
            });
        }
        if payload.len() > expected {
            return Err(StoreError::TrailingBytes(payload.len() - expected));
        }

        let actual = xxh3_64(payload);
        if actual != header.checksum {
            return Err(StoreError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }

        bincode::deserialize(payload).map_err(StoreError::Decode)
    }

    /// Replace the entire contents of this store with a decoded snapshot
    ///
    /// Decodes fully before publishing, so on error the store is unchanged.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        *self = Self::decode(bytes)?;
        Ok(())
    }

    /// xxh3 checksum of the encoded store
    ///
    /// Equal on all peers whose stores are equal.
    pub fn checksum(&self) -> Result<u64, StoreError> {
        let bytes = self.serialize()?;
        Ok(xxh3_64(&bytes[STORE_HEADER_SIZE..]))
    }
}
