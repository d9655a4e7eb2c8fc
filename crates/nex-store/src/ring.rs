use std::collections::VecDeque;

/// Newest-first sequence that never grows past its capacity.
///
/// Pushing to the front drops from the back, so the log always holds the
/// `capacity` most recent items.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Insert at the front and return how many old items fell off the back.
    pub fn push_front(&mut self, item: T) -> usize {
        self.items.push_front(item);
        let overflow = self.items.len().saturating_sub(self.capacity);
        self.items.truncate(self.capacity);
        overflow
    }

    /// Keep only items matching `keep`; returns how many were removed.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> BoundedLog<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
