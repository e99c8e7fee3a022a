//! Frame snapshot for rollback

use xxhash_rust::xxh3::Xxh3;

/// Snapshot of all rollback-relevant state at one frame
///
/// Holds the encoded [`ScriptStore`](crate::ScriptStore), the engine's own
/// state blob, and a checksum over both for desync detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Frame number this snapshot was taken at
    pub frame: i32,
    /// Encoded script store
    pub store_data: Vec<u8>,
    /// Engine state blob
    pub engine_data: Vec<u8>,
    /// xxHash3 checksum over store and engine data
    pub checksum: u64,
}

/// Lightweight handle to a snapshot, handed to GGRS in place of the data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotRef {
    pub frame: i32,
    pub checksum: u64,
}

impl FrameSnapshot {
    pub fn new(frame: i32, store_data: Vec<u8>, engine_data: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&store_data, &engine_data);
        Self {
            frame,
            store_data,
            engine_data,
            checksum,
        }
    }

    /// Total snapshot size in bytes
    pub fn total_len(&self) -> usize {
        self.store_data.len() + self.engine_data.len()
    }

    /// True if the data still matches the checksum taken at save time
    pub fn verify(&self) -> bool {
        Self::compute_checksum(&self.store_data, &self.engine_data) == self.checksum
    }

    pub fn reference(&self) -> SnapshotRef {
        SnapshotRef {
            frame: self.frame,
            checksum: self.checksum,
        }
    }

    /// Compute xxHash3 checksum for desync detection
    ///
    /// The store length is mixed in so moving bytes between the two blobs
    /// changes the checksum.
    fn compute_checksum(store_data: &[u8], engine_data: &[u8]) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&(store_data.len() as u64).to_le_bytes());
        hasher.update(store_data);
        hasher.update(engine_data);
        hasher.digest()
    }
}
