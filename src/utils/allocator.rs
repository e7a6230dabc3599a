use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed index into an [`Arena`], with generation tracking to reject stale references.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Handle<T> {
    index: usize,
    generation: u32,
    #[serde(skip)]
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn new(index: usize, generation: u32) -> Self {
        Self {
            index,
            generation,
            marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Sentinel handle that never resolves.
    pub fn null() -> Self {
        Self::new(usize::MAX, 0)
    }

    pub fn is_null(&self) -> bool {
        self.index == usize::MAX
    }
}

// Manual impls: derives would put bounds on `T`, which only appears as a marker.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.generation).cmp(&(other.index, other.generation))
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Generational arena that hands out stable handles while preventing use-after-free.
///
/// Removing an item bumps the slot generation, so every handle issued for the
/// previous occupant stops resolving.
pub struct Arena<T> {
    items: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: VecDeque<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generations: Vec::new(),
            free_list: VecDeque::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free_list.pop_front() {
            self.items[index] = Some(item);
            return Handle::new(index, self.generations[index]);
        }

        let index = self.items.len();
        self.items.push(Some(item));
        self.generations.push(0);
        Handle::new(index, 0)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if !self.is_current(handle) {
            return None;
        }
        self.items.get(handle.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if !self.is_current(handle) {
            return None;
        }
        self.items.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Borrows two distinct live items mutably, in argument order.
    pub fn get2_mut(&mut self, a: Handle<T>, b: Handle<T>) -> Option<(&mut T, &mut T)> {
        if a.index() == b.index() || !self.is_current(a) || !self.is_current(b) {
            return None;
        }

        let (low, high) = if a.index() < b.index() { (a, b) } else { (b, a) };
        if high.index() >= self.items.len() {
            return None;
        }

        let (left, right) = self.items.split_at_mut(high.index());
        let low_item = left[low.index()].as_mut()?;
        let high_item = right[0].as_mut()?;

        if a.index() < b.index() {
            Some((low_item, high_item))
        } else {
            Some((high_item, low_item))
        }
    }

    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        if !self.is_current(handle) {
            return None;
        }
        let item = self.items[handle.index()].take()?;
        self.generations[handle.index()] = self.generations[handle.index()].wrapping_add(1);
        self.free_list.push_back(handle.index());
        self.len -= 1;
        Some(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_ref()
                    .map(|item| (Handle::new(index, self.generations[index]), item))
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        let generations = &self.generations;
        self.items
            .iter_mut()
            .enumerate()
            .filter_map(move |(index, slot)| {
                slot.as_mut()
                    .map(|item| (Handle::new(index, generations[index]), item))
            })
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_current(&self, handle: Handle<T>) -> bool {
        self.generations
            .get(handle.index())
            .is_some_and(|generation| *generation == handle.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handles_go_stale() {
        let mut arena = Arena::new();
        let first = arena.insert(1);
        assert_eq!(arena.remove(first), Some(1));

        let second = arena.insert(2);
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&2));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn get2_mut_keeps_argument_order() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");

        let (x, y) = arena.get2_mut(b, a).unwrap();
        assert_eq!((*x, *y), ("b", "a"));
        assert!(arena.get2_mut(a, a).is_none());
    }

    #[test]
    fn null_handle_never_resolves() {
        let mut arena = Arena::new();
        arena.insert(0.5_f32);
        assert!(arena.get(Handle::null()).is_none());
        assert!(Handle::<f32>::default().is_null());
    }
}
