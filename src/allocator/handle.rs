use std::cell::{Ref, RefMut};
use std::rc::Rc;

use crate::allocator::SlotId;
use crate::allocator::pool::{Pool, Slot};

pub struct Handle<'pool, T> {
    pool: &'pool Pool<T>,
    slot: Rc<Slot<T>>,
    generation: u32,
}

impl<'pool, T> Handle<'pool, T> {
    pub(crate) fn new(pool: &'pool Pool<T>, slot: Rc<Slot<T>>, generation: u32) -> Handle<'pool, T> {
        return Handle {
            pool: pool,
            slot: slot,
            generation: generation,
        };
    }

    pub fn slot_id(&self) -> SlotId {
        self.slot.id
    }

    pub fn is_acquired(&self) -> bool {
        self.slot.acquired.get() && !self.is_stale()
    }

    // the slot was handed to a newer borrower
    fn is_stale(&self) -> bool {
        self.slot.generation.get() != self.generation
    }

    /// The element, or `None` once the slot belongs to a newer handle.
    pub fn data(&self) -> Option<Ref<'_, T>> {
        if self.is_stale() {
            return None;
        }
        Some(self.slot.element.borrow())
    }

    pub fn data_mut(&mut self) -> Option<RefMut<'_, T>> {
        if self.is_stale() {
            return None;
        }
        Some(self.slot.element.borrow_mut())
    }

    pub fn free(&mut self) {
        if !self.is_acquired() {
            return;
        }
        // pool side first, then the flag
        self.pool.release(self.slot.id);
        self.slot.acquired.set(false);
    }
}

impl<'pool, T> Drop for Handle<'pool, T> {
    fn drop(&mut self) {
        self.free();
    }
}
