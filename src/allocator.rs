pub mod config;
pub mod handle;
pub mod pool;

use thiserror::Error;

pub type SlotId = u16;

pub const MAX_CAPACITY: usize = SlotId::MAX as usize + 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted: all {capacity} slots are in use and the pool cannot grow")]
    Exhausted { capacity: usize },
    #[error("invalid pool capacity {requested}, expected a value between 1 and {max}")]
    InvalidCapacity { requested: usize, max: usize },
}
