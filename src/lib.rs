pub mod allocator;

pub use crate::allocator::config::{DEFAULT_INITIAL_LENGTH, PoolConfig};
pub use crate::allocator::handle::Handle;
pub use crate::allocator::pool::Pool;
pub use crate::allocator::{MAX_CAPACITY, PoolError, SlotId};
