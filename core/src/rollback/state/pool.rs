//! Recycled byte buffers for snapshot payloads

/// Free list of snapshot payload buffers
///
/// Every [`FrameSnapshot`](super::FrameSnapshot) owns two buffers: the encoded
/// store and the engine blob. Once the ring is full each save evicts a
/// snapshot, and its buffers come back here for the next save.
pub struct StatePool {
    free: Vec<Vec<u8>>,
    /// Capacity fresh buffers start with
    initial_capacity: usize,
    /// Returned buffers that grew past this are dropped
    retain_limit: usize,
    /// Most buffers held at once
    max_free: usize,
}

impl StatePool {
    /// Pool stocked for a ring of `ring_capacity` snapshots
    ///
    /// `retain_limit` is normally the snapshot size limit, so a single
    /// oversized state cannot pin memory in the pool.
    pub fn for_ring(ring_capacity: usize, initial_capacity: usize, retain_limit: usize) -> Self {
        let max_free = Self::buffers_for(ring_capacity);
        Self {
            free: (0..max_free)
                .map(|_| Vec::with_capacity(initial_capacity))
                .collect(),
            initial_capacity,
            retain_limit,
            max_free,
        }
    }

    /// A full ring plus one save in flight, two buffers each
    fn buffers_for(ring_capacity: usize) -> usize {
        2 * (ring_capacity + 1)
    }

    /// Follow a ring resize; surplus free buffers are released
    pub fn fit_ring(&mut self, ring_capacity: usize) {
        self.max_free = Self::buffers_for(ring_capacity);
        self.free.truncate(self.max_free);
    }

    /// Take an empty buffer
    pub fn acquire(&mut self) -> Vec<u8> {
        match self.free.pop() {
            Some(buffer) => buffer,
            None => {
                log::warn!("snapshot buffer pool empty, allocating");
                Vec::with_capacity(self.initial_capacity)
            }
        }
    }

    /// Hand a buffer back; it is cleared but keeps its capacity
    pub fn release(&mut self, mut buffer: Vec<u8>) {
        if buffer.capacity() > self.retain_limit || self.free.len() >= self.max_free {
            return;
        }
        buffer.clear();
        self.free.push(buffer);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}
