use super::Buffer;
use crate::protocol::ParseError;
use crate::utils::ensure;
use std::fmt::Debug;

const DEFAULT_CAPACITY: usize = 1024;
const DEFAULT_LIMIT: usize = 16 * 1024 * 1024;

/// Hands out [`Buffer`]s to the consumers.
///
/// Allocators are shared between the consumers of one message, usually as an
/// `Arc<dyn Allocator>`.
pub trait Allocator: Debug + Send + Sync {
    fn allocate(&self) -> Buffer;

    /// Allocates a buffer expected to hold about `size_hint` bytes.
    fn allocate_with(&self, size_hint: usize) -> Result<Buffer, ParseError>;
}

/// Allocates heap buffers with a fixed initial capacity and limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayAllocator {
    capacity: usize,
    limit: usize,
}

impl ArrayAllocator {
    pub fn new(capacity: usize, limit: usize) -> Self {
        Self { capacity, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for ArrayAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_LIMIT)
    }
}

impl Allocator for ArrayAllocator {
    fn allocate(&self) -> Buffer {
        Buffer::new(self.capacity, self.limit)
    }

    fn allocate_with(&self, size_hint: usize) -> Result<Buffer, ParseError> {
        ensure!(size_hint <= self.limit, ParseError::allocation(size_hint, self.limit));
        Ok(Buffer::new(size_hint.max(self.capacity), self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_with_hint() {
        let allocator = ArrayAllocator::new(16, 1024);
        let buffer = allocator.allocate_with(512).unwrap();
        assert_eq!(buffer.limit(), 1024);
        assert!(buffer.is_empty());

        assert!(matches!(allocator.allocate_with(2048), Err(ParseError::Allocation { requested: 2048, limit: 1024 })));
    }
}
