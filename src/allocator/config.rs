use crate::allocator::{MAX_CAPACITY, PoolError};

pub const DEFAULT_INITIAL_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    // 0 falls back to DEFAULT_INITIAL_LENGTH
    pub initial_length: usize,
    pub max_capacity: usize,
}

impl PoolConfig {
    pub fn new(initial_length: usize) -> PoolConfig {
        return PoolConfig {
            initial_length: initial_length,
            max_capacity: MAX_CAPACITY,
        };
    }

    pub fn with_initial_length(mut self, initial_length: usize) -> PoolConfig {
        self.initial_length = initial_length;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> PoolConfig {
        self.max_capacity = max_capacity;
        self
    }

    pub fn growth_seed(&self) -> usize {
        match self.initial_length {
            0 => DEFAULT_INITIAL_LENGTH,
            length => length,
        }
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_capacity == 0 || self.max_capacity > MAX_CAPACITY {
            return Err(PoolError::InvalidCapacity {
                requested: self.max_capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> PoolConfig {
        PoolConfig::new(DEFAULT_INITIAL_LENGTH)
    }
}
