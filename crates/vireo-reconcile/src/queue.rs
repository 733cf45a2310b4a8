//! FIFO of pending indices.

/// A queue with amortized O(1) dequeue.
///
/// Items are read from a moving offset into a `Vec`; the consumed prefix is
/// dropped once it makes up at least half of the storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkQueue<T> {
    items: Vec<T>,
    offset: usize,
}

impl<T: Clone> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            offset: 0,
        }
    }

    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            offset: 0,
        }
    }

    /// Number of items not yet dequeued.
    pub fn len(&self) -> usize {
        self.items.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an item. Duplicates are allowed.
    pub fn add(&mut self, item: T) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> &mut Self {
        self.items.extend(items);
        self
    }

    /// The earliest remaining item, without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.get(self.offset)
    }

    /// Remove and return the earliest remaining item.
    pub fn get(&mut self) -> Option<T> {
        let item = self.items.get(self.offset).cloned()?;
        self.offset += 1;
        if self.offset * 2 >= self.items.len() {
            self.items.drain(..self.offset);
            self.offset = 0;
        }
        Some(item)
    }

    /// Replace the whole contents.
    pub fn set(&mut self, items: impl IntoIterator<Item = T>) -> &mut Self {
        self.items.clear();
        self.items.extend(items);
        self.offset = 0;
        self
    }

    /// Remaining items in dequeue order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items[self.offset..].iter()
    }
}
