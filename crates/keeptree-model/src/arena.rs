//! Generational slot storage backing the forest.

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot vector whose handles go stale when a slot is freed.
///
/// Freeing a slot bumps its generation, so a handle issued before the free
/// never resolves to whatever is stored in the slot afterwards.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Store a value and return its `(index, generation)`.
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return (index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    pub(crate) fn get(&self, index: usize, generation: u32) -> Option<&T> {
        self.slots
            .get(index)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: usize, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Free a slot, returning its value.
    pub(crate) fn remove(&mut self, index: usize, generation: u32) -> Option<T> {
        let slot = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index as u32);
        self.len -= 1;
        Some(value)
    }

    /// Iterate over live values as `(index, generation, value)`.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (index as u32, slot.generation, value))
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut arena = Arena::default();
        let (index, generation) = arena.insert("a");
        assert_eq!(arena.get(index as usize, generation), Some(&"a"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_removed_handle_goes_stale() {
        let mut arena = Arena::default();
        let (index, generation) = arena.insert(1);
        assert_eq!(arena.remove(index as usize, generation), Some(1));
        assert!(arena.get(index as usize, generation).is_none());

        // The slot is reused with a new generation.
        let (reused, next) = arena.insert(2);
        assert_eq!(reused, index);
        assert_ne!(next, generation);
        assert!(arena.get(index as usize, generation).is_none());
        assert_eq!(arena.get(reused as usize, next), Some(&2));
        assert_eq!(arena.iter().count(), 1);
    }

    #[test]
    fn test_double_remove() {
        let mut arena = Arena::default();
        let (index, generation) = arena.insert(());
        assert!(arena.remove(index as usize, generation).is_some());
        assert!(arena.remove(index as usize, generation).is_none());
        assert_eq!(arena.len(), 0);
    }
}
