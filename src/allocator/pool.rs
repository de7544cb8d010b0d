use log::{debug, trace, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::allocator::config::PoolConfig;
use crate::allocator::handle::Handle;
use crate::allocator::{PoolError, SlotId};

/// Smallest step the pool grows by when doubling does not fit.
const MIN_GROWTH: usize = 8;

pub(crate) struct Slot<T> {
    pub(crate) id: SlotId,
    pub(crate) element: RefCell<T>,
    pub(crate) acquired: Cell<bool>,
    pub(crate) generation: Cell<u32>,
}

impl<T> Slot<T> {
    fn new(id: SlotId, element: T) -> Slot<T> {
        return Slot {
            id: id,
            element: RefCell::new(element),
            acquired: Cell::new(false),
            generation: Cell::new(0),
        };
    }
}

/// The free stack is split by `pointer`: `free_stack[..pointer]` holds the ids
/// of acquired slots in acquisition order and `free_stack[pointer..]` holds the
/// ids that are available. Released ids are written back at the split point, so
/// the most recently released slot is the next one acquired.
///
/// Elements are created once by the factory and are never reset on reuse.
pub struct Pool<T> {
    slots: RefCell<Vec<Rc<Slot<T>>>>,
    free_stack: RefCell<Vec<SlotId>>,
    pointer: Cell<usize>,
    imbalances: Cell<usize>,
    growth_seed: usize,
    max_capacity: usize,
    factory: RefCell<Box<dyn FnMut() -> T>>,
}

impl<T> Pool<T> {
    pub fn new<F>(factory: F, initial_length: usize) -> Pool<T>
    where
        F: FnMut() -> T + 'static,
    {
        Self::build(Box::new(factory), PoolConfig::new(initial_length))
    }

    pub fn with_default_length<F>(factory: F) -> Pool<T>
    where
        F: FnMut() -> T + 'static,
    {
        Self::build(Box::new(factory), PoolConfig::default())
    }

    pub fn with_config<F>(factory: F, config: PoolConfig) -> Result<Pool<T>, PoolError>
    where
        F: FnMut() -> T + 'static,
    {
        config.validate()?;
        Ok(Self::build(Box::new(factory), config))
    }

    fn build(factory: Box<dyn FnMut() -> T>, config: PoolConfig) -> Pool<T> {
        let pool = Pool {
            slots: RefCell::new(Vec::new()),
            free_stack: RefCell::new(Vec::new()),
            pointer: Cell::new(0),
            imbalances: Cell::new(0),
            growth_seed: config.growth_seed(),
            max_capacity: config.max_capacity,
            factory: RefCell::new(factory),
        };
        pool.grow();
        return pool;
    }

    pub fn len(&self) -> usize {
        self.free_stack.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_use(&self) -> usize {
        self.pointer.get()
    }

    pub fn available(&self) -> usize {
        self.len() - self.pointer.get()
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Releases rejected because no slot was in use.
    pub fn imbalances(&self) -> usize {
        self.imbalances.get()
    }

    pub fn is_acquired(&self, slot_id: SlotId) -> bool {
        match self.slots.borrow().get(slot_id as usize) {
            None => false,
            Some(slot) => slot.acquired.get(),
        }
    }

    // false when already at the ceiling
    fn grow(&self) -> bool {
        let current = self.len();
        let mut target = if current > 0 {
            current * 2
        } else {
            self.growth_seed
        };
        if target <= current || target > self.max_capacity {
            target = self
                .max_capacity
                .min(current + self.growth_seed.max(MIN_GROWTH));
        }
        if target <= current {
            return false;
        }

        let mut slots = self.slots.borrow_mut();
        let mut free_stack = self.free_stack.borrow_mut();
        let mut factory = self.factory.borrow_mut();
        slots.reserve_exact(target - current);
        free_stack.reserve_exact(target - current);
        for index in current..target {
            debug_assert!(index < crate::allocator::MAX_CAPACITY);
            let id = index as SlotId;
            slots.push(Rc::new(Slot::new(id, (*factory)())));
            free_stack.push(id);
        }

        debug!("pool grew from {} to {} slots", current, target);
        true
    }

    pub fn acquire(&self) -> Result<Handle<'_, T>, PoolError> {
        if self.pointer.get() >= self.len() && !self.grow() {
            return Err(PoolError::Exhausted {
                capacity: self.len(),
            });
        }

        let pointer = self.pointer.get();
        let id = self.free_stack.borrow()[pointer];
        let slot = Rc::clone(&self.slots.borrow()[id as usize]);
        self.pointer.set(pointer + 1);

        slot.acquired.set(true);
        let generation = slot.generation.get().wrapping_add(1);
        slot.generation.set(generation);

        trace!("acquired slot {} ({} in use)", id, pointer + 1);
        Ok(Handle::new(self, slot, generation))
    }

    pub fn try_acquire(&self) -> Option<Handle<'_, T>> {
        self.acquire().ok()
    }

    /// Returns `slot_id` to the free stack. Returns false, leaving the pool
    /// untouched, when nothing is in use or the id is not part of this pool.
    ///
    /// Only moves the id across the split point; the slot's acquired flag is
    /// cleared by [`Handle::free`].
    pub fn release(&self, slot_id: SlotId) -> bool {
        if slot_id as usize >= self.len() {
            warn!(
                "ignoring release of slot {} in a pool of {} slots",
                slot_id,
                self.len()
            );
            return false;
        }

        let pointer = self.pointer.get();
        if pointer == 0 {
            warn!(
                "pool imbalance: release of slot {} while no slot is in use",
                slot_id
            );
            self.imbalances.set(self.imbalances.get() + 1);
            return false;
        }

        let pointer = pointer - 1;
        self.free_stack.borrow_mut()[pointer] = slot_id;
        self.pointer.set(pointer);
        trace!("released slot {} ({} in use)", slot_id, pointer);
        true
    }

    pub fn release_all(&self) {
        let slots = self.slots.borrow();
        let mut free_stack = self.free_stack.borrow_mut();
        for (index, slot) in slots.iter().enumerate() {
            slot.acquired.set(false);
            free_stack[index] = slot.id;
        }
        self.pointer.set(0);
        debug!("released all {} slots", slots.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_pool(initial_length: usize) -> (Pool<usize>, Rc<Cell<usize>>) {
        let created = Rc::new(Cell::new(0));
        let counter = Rc::clone(&created);
        let pool = Pool::new(
            move || {
                let value = counter.get();
                counter.set(value + 1);
                value
            },
            initial_length,
        );
        (pool, created)
    }

    fn free_stack(pool: &Pool<usize>) -> Vec<SlotId> {
        pool.free_stack.borrow().clone()
    }

    #[test]
    fn construction_fills_initial_slots() {
        let (pool, created) = counting_pool(4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(created.get(), 4);
        assert_eq!(free_stack(&pool), vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_length_uses_default() {
        let (pool, _) = counting_pool(0);
        assert_eq!(pool.len(), 8);
        let pool = Pool::with_default_length(|| 0u8);
        assert_eq!(pool.len(), 8);
    }

    #[test]
    fn grow_doubles_and_keeps_pointer() {
        let (pool, created) = counting_pool(2);
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.in_use(), 2);

        assert!(pool.grow());
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.in_use(), 2);
        assert_eq!(created.get(), 4);
        assert_eq!(free_stack(&pool), vec![0, 1, 2, 3]);
        assert!(pool.is_acquired(0));
        assert!(pool.is_acquired(1));
        assert!(!pool.is_acquired(2));
    }

    #[test]
    fn grow_falls_back_to_ceiling() {
        let config = PoolConfig::new(3).with_max_capacity(5);
        let pool = Pool::with_config(|| 0u32, config).unwrap();
        assert_eq!(pool.len(), 3);

        assert!(pool.grow());
        assert_eq!(pool.len(), 5);
        assert!(!pool.grow());
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn initial_length_is_clamped_to_ceiling() {
        let config = PoolConfig::new(100).with_max_capacity(10);
        let pool = Pool::with_config(|| 0u32, config).unwrap();
        assert_eq!(pool.len(), 10);
    }

    #[test]
    fn acquire_follows_free_stack_order() {
        let (pool, _) = counting_pool(3);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_eq!(a.slot_id(), 0);
        assert_eq!(b.slot_id(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn release_writes_at_split_point() {
        let (pool, _) = counting_pool(3);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        let (a_id, b_id) = (a.slot_id(), b.slot_id());
        std::mem::forget(a);
        std::mem::forget(b);

        assert!(pool.release(a_id));
        assert_eq!(pool.in_use(), 1);
        assert_eq!(free_stack(&pool)[1], a_id);
        assert!(pool.release(b_id));
        assert_eq!(free_stack(&pool)[0], b_id);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn release_with_nothing_in_use_is_ignored() {
        let (pool, _) = counting_pool(2);
        let before = free_stack(&pool);
        assert!(!pool.release(1));
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.imbalances(), 1);
        assert_eq!(free_stack(&pool), before);
    }

    #[test]
    fn repeated_direct_release_drifts_then_reports_imbalance() {
        let (pool, _) = counting_pool(2);
        let h1 = pool.acquire().unwrap();
        let h2 = pool.acquire().unwrap();
        let id = h1.slot_id();
        std::mem::forget(h1);
        std::mem::forget(h2);

        assert!(pool.release(id));
        assert_eq!(free_stack(&pool), vec![0, 0]);
        assert!(pool.release(id));
        assert_eq!(free_stack(&pool), vec![0, 0]);
        assert_eq!(pool.imbalances(), 0);

        assert!(!pool.release(id));
        assert_eq!(pool.in_use(), 0);
        assert_eq!(free_stack(&pool), vec![0, 0]);
        assert_eq!(pool.imbalances(), 1);
    }

    #[test]
    fn release_of_unknown_slot_is_ignored() {
        let (pool, _) = counting_pool(2);
        let handle = pool.acquire().unwrap();
        assert!(!pool.release(7));
        assert_eq!(pool.in_use(), 1);
        drop(handle);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn release_all_restores_identity_order() {
        let (pool, _) = counting_pool(4);
        let a = pool.acquire().unwrap();
        let mut b = pool.acquire().unwrap();
        let c = pool.acquire().unwrap();
        b.free();
        let d = pool.acquire().unwrap();
        assert_eq!(d.slot_id(), 1);

        pool.release_all();
        assert_eq!(pool.in_use(), 0);
        assert_eq!(free_stack(&pool), vec![0, 1, 2, 3]);
        assert!(!a.is_acquired());
        assert!(!c.is_acquired());
        assert!(!d.is_acquired());
        for id in 0..4 {
            assert!(!pool.is_acquired(id));
        }
    }
}
