//! Generic keyed collection cache.
//!
//! One abstraction covers every list the client caches (servers,
//! rooms), parameterized by the entity type and its key extractor.
//! Every mutation is idempotent under repeated application of the same
//! logical change and preserves list order: `add` appends in insertion
//! order, `update`/`patch` replace in place.

use causerie_shared::{MessageResponse, Room, RoomId, RoomsServer, ServerId, User, UserId};

/// An entity with a stable cache key.
pub trait Keyed {
    type Key: Copy + Eq;

    fn key(&self) -> Self::Key;
}

impl Keyed for Room {
    type Key = RoomId;

    fn key(&self) -> RoomId {
        self.id
    }
}

impl Keyed for RoomsServer {
    type Key = ServerId;

    fn key(&self) -> ServerId {
        self.id
    }
}

impl Keyed for User {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id
    }
}

impl Keyed for MessageResponse {
    type Key = causerie_shared::MessageId;

    fn key(&self) -> causerie_shared::MessageId {
        self.id()
    }
}

/// An ordered, key-unique collection.
#[derive(Debug, Clone)]
pub struct CollectionCache<T: Keyed> {
    items: Vec<T>,
}

impl<T: Keyed> CollectionCache<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build from a fetched list, de-duplicating by key (later copies
    /// win, in place).
    pub fn from_items(items: Vec<T>) -> Self {
        let mut cache = Self::new();
        for item in items {
            cache.add(item);
        }
        cache
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn contains(&self, key: T::Key) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.position(key).map(|i| &self.items[i])
    }

    /// Insert the entity.  If its key is already cached the existing
    /// entry is replaced in place, so adding the same entity twice
    /// leaves one copy where it was.
    pub fn add(&mut self, item: T) {
        match self.position(item.key()) {
            Some(i) => self.items[i] = item,
            None => self.items.push(item),
        }
    }

    /// Remove by key.  Returns the removed entity, if it was cached.
    pub fn remove(&mut self, key: T::Key) -> Option<T> {
        self.position(key).map(|i| self.items.remove(i))
    }

    /// Replace an existing entry in place.  Unlike [`add`], a missing
    /// key is a no-op: updates never resurrect removed entities.
    ///
    /// [`add`]: CollectionCache::add
    pub fn update(&mut self, item: T) -> bool {
        match self.position(item.key()) {
            Some(i) => {
                self.items[i] = item;
                true
            }
            None => false,
        }
    }

    /// Partially update the entry with the given key in place.
    pub fn patch(&mut self, key: T::Key, patch: impl FnOnce(&mut T)) -> bool {
        match self.position(key) {
            Some(i) => {
                patch(&mut self.items[i]);
                true
            }
            None => false,
        }
    }

    /// Replace the whole collection with a freshly fetched list.
    pub fn replace_all(&mut self, items: Vec<T>) {
        *self = Self::from_items(items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn position(&self, key: T::Key) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }
}

impl<T: Keyed> Default for CollectionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
