//! Single-slot mailbox with keep-latest semantics.

/// Holds at most one pending item. Offering a new item while one is
/// pending replaces (drops) the older one.
#[derive(Debug)]
pub struct FrameSlot<T> {
    pending: Option<T>,
    dropped: u64,
}

impl<T> FrameSlot<T> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            dropped: 0,
        }
    }

    /// Store `item`, returning the pending item it displaced, if any.
    pub fn offer(&mut self, item: T) -> Option<T> {
        let displaced = self.pending.replace(item);
        if displaced.is_some() {
            self.dropped += 1;
        }
        displaced
    }

    /// Remove and return the pending item.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pending.is_none()
    }

    /// Number of items displaced by newer offers so far.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_takes_nothing() {
        let mut slot: FrameSlot<u32> = FrameSlot::new();
        assert!(slot.is_empty());
        assert_eq!(slot.take(), None);
        assert_eq!(slot.dropped(), 0);
    }

    #[test]
    fn offer_then_take() {
        let mut slot = FrameSlot::new();
        assert_eq!(slot.offer(1), None);
        assert!(!slot.is_empty());
        assert_eq!(slot.take(), Some(1));
        assert!(slot.is_empty());
    }

    #[test]
    fn newer_offer_replaces_pending() {
        let mut slot = FrameSlot::new();
        slot.offer(1);
        assert_eq!(slot.offer(2), Some(1));
        assert_eq!(slot.offer(3), Some(2));
        assert_eq!(slot.take(), Some(3));
        assert_eq!(slot.dropped(), 2);
    }

    #[test]
    fn taken_items_are_not_counted_as_dropped() {
        let mut slot = FrameSlot::new();
        slot.offer(1);
        slot.take();
        slot.offer(2);
        assert_eq!(slot.dropped(), 0);
    }
}
