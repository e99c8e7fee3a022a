//! Fixed-capacity snapshot ring indexed by `frame mod capacity`

use super::snapshot::FrameSnapshot;

/// Circular buffer of frame snapshots
///
/// Each slot remembers which frame it holds, so a load for a frame whose
/// slot has since been reused reports the frame as missing instead of
/// returning another frame's data.
pub struct SnapshotRing {
    slots: Vec<Option<FrameSnapshot>>,
}

impl SnapshotRing {
    /// Create a ring with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot index for a frame; `None` for negative frames
    pub fn slot_for(&self, frame: i32) -> Option<usize> {
        let frame = usize::try_from(frame).ok()?;
        Some(frame % self.slots.len())
    }

    /// Store a snapshot in its frame's slot
    ///
    /// Returns the snapshot previously held by that slot so its buffers can
    /// be recycled. Snapshots for negative frames are handed straight back.
    pub fn insert(&mut self, snapshot: FrameSnapshot) -> Option<FrameSnapshot> {
        let Some(slot) = self.slot_for(snapshot.frame) else {
            return Some(snapshot);
        };
        if let Some(previous) = &self.slots[slot] {
            if previous.frame > snapshot.frame {
                log::debug!(
                    "Snapshot for frame {} replaces newer frame {}",
                    snapshot.frame,
                    previous.frame
                );
            }
        }
        self.slots[slot].replace(snapshot)
    }

    /// Snapshot for exactly `frame`, or `None` if it was never saved or has
    /// been overwritten
    pub fn load(&self, frame: i32) -> Option<&FrameSnapshot> {
        let slot = self.slot_for(frame)?;
        self.slots[slot]
            .as_ref()
            .filter(|snapshot| snapshot.frame == frame)
    }

    pub fn contains(&self, frame: i32) -> bool {
        self.load(frame).is_some()
    }

    /// Saved frames, oldest first
    pub fn frames(&self) -> Vec<i32> {
        let mut frames: Vec<i32> = self.slots.iter().flatten().map(|s| s.frame).collect();
        frames.sort_unstable();
        frames
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Empty every slot, returning the removed snapshots
    pub fn clear(&mut self) -> Vec<FrameSnapshot> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Change the number of slots
    ///
    /// Existing snapshots are discarded rather than reinterpreted under the
    /// new modulus. Returns them for recycling.
    pub fn resize(&mut self, capacity: usize) -> Vec<FrameSnapshot> {
        let removed = self.clear();
        self.slots.resize_with(capacity.max(1), || None);
        removed
    }
}
