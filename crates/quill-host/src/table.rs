//! Handle allocation.
//!
//! Handles are small integers starting at 1. Released ids go on a free list
//! and are handed out again, so a stale handle may name an unrelated resource.

use crate::error::{HostError, HostResult};

/// Slot table mapping `u32` handles to host resources.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    slots: Vec<Option<T>>,
    free: Vec<u32>,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> HandleTable<T> {
    pub(crate) fn insert(&mut self, resource: T) -> u32 {
        if let Some(id) = self.free.pop() {
            self.slots[index(id)] = Some(resource);
            return id;
        }
        self.slots.push(Some(resource));
        u32::try_from(self.slots.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn get(&self, id: u32) -> HostResult<&T> {
        id.checked_sub(1)
            .and_then(|i| self.slots.get(i as usize))
            .and_then(Option::as_ref)
            .ok_or(HostError::InvalidHandle(id))
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> HostResult<&mut T> {
        id.checked_sub(1)
            .and_then(|i| self.slots.get_mut(i as usize))
            .and_then(Option::as_mut)
            .ok_or(HostError::InvalidHandle(id))
    }

    pub(crate) fn remove(&mut self, id: u32) -> HostResult<T> {
        let resource = id
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i as usize))
            .and_then(Option::take)
            .ok_or(HostError::InvalidHandle(id))?;
        self.free.push(id);
        Ok(resource)
    }

    /// Number of live handles.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

fn index(id: u32) -> usize {
    (id as usize).saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut table = HandleTable::default();
        assert_eq!(table.insert("a"), 1);
        assert_eq!(table.insert("b"), 2);
        assert!(matches!(table.get(0), Err(HostError::InvalidHandle(0))));
    }

    #[test]
    fn released_ids_are_reused() {
        let mut table = HandleTable::default();
        let a = table.insert("a");
        let _b = table.insert("b");
        assert_eq!(table.remove(a).unwrap(), "a");
        assert!(table.get(a).is_err());
        assert_eq!(table.insert("c"), a);
        assert_eq!(*table.get(a).unwrap(), "c");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn double_remove_is_rejected() {
        let mut table = HandleTable::default();
        let a = table.insert(1);
        table.remove(a).unwrap();
        assert!(matches!(table.remove(a), Err(HostError::InvalidHandle(_))));
    }
}
