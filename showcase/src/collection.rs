//! Ordered, id-keyed collections shared by the blog, billing and cart features.
//!
//! A [`Collection`] is the local-state idiom on its own: it can be owned and
//! mutated directly through its methods, and the feature reducers use the
//! same methods to implement their actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an item within one collection
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Creates an id from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Anything stored in a [`Collection`]
pub trait Entity {
    /// The item's id, which never changes after creation
    fn id(&self) -> ItemId;
}

/// Items in append order, unique by id
///
/// Updates happen in place and never reorder the sequence.
///
/// # Example
///
/// ```
/// use cartwheel::collection::{Collection, Entity, ItemId};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Note {
///     id: ItemId,
///     text: String,
/// }
///
/// impl Entity for Note {
///     fn id(&self) -> ItemId {
///         self.id
///     }
/// }
///
/// let mut notes = Collection::new();
/// assert!(notes.push(Note { id: ItemId::new(1), text: "first".into() }));
/// assert!(!notes.push(Note { id: ItemId::new(1), text: "again".into() }));
/// assert_eq!(notes.len(), 1);
///
/// notes.update(ItemId::new(1), |n| n.text.push('!'));
/// assert_eq!(notes.get(ItemId::new(1)).map(|n| n.text.as_str()), Some("first!"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    /// Creates an empty collection
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Wraps items as given, without checking ids
    #[must_use]
    pub const fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over items in append order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Items as a slice, in append order
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Looks up an item by id
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Looks up an item by id for in-place mutation
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Returns `true` if an item with `id` is present
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Appends `item` unless its id is already taken
    ///
    /// Returns `false`, leaving the collection unchanged, on a duplicate id.
    pub fn push(&mut self, item: T) -> bool {
        if self.contains(item.id()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Removes and returns the item with `id`, if any
    pub fn remove(&mut self, id: ItemId) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Applies `f` to the item with `id`
    ///
    /// Returns `false` if no such item exists.
    pub fn update<F>(&mut self, id: ItemId, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.get_mut(id) {
            Some(item) => {
                f(item);
                true
            },
            None => false,
        }
    }

    /// Keeps only the items matching `keep`
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.items.retain(keep);
    }

    /// Removes every item
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replaces the contents wholesale, without checking ids
    pub fn replace(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Consumes the collection, returning its items
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Entity> FromIterator<T> for Collection<T> {
    /// Collects items, skipping any whose id was already seen
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for item in iter {
            collection.push(item);
        }
        collection
    }
}
