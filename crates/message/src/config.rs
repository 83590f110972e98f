/// Default limit of a header block, request line included.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;
/// Default limit of header fields in one block.
pub const MAX_HEADER_NUM: usize = 64;
/// Default limit of nested `multipart/*` levels inside one series.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Limits applied by the consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerConfig {
    max_header_bytes: usize,
    max_header_num: usize,
    max_nesting_depth: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self { max_header_bytes: MAX_HEADER_BYTES, max_header_num: MAX_HEADER_NUM, max_nesting_depth: MAX_NESTING_DEPTH }
    }
}

impl ConsumerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum size of a header block in bytes.
    #[must_use]
    pub fn max_header_bytes(mut self, size: usize) -> Self {
        self.max_header_bytes = size;
        self
    }

    /// Set the maximum number of header fields in a block.
    #[must_use]
    pub fn max_header_num(mut self, count: usize) -> Self {
        self.max_header_num = count;
        self
    }

    /// Set how many multipart levels may be nested inside a series.
    #[must_use]
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    #[must_use]
    pub fn get_max_header_bytes(&self) -> usize {
        self.max_header_bytes
    }

    #[must_use]
    pub fn get_max_header_num(&self) -> usize {
        self.max_header_num
    }

    #[must_use]
    pub fn get_max_nesting_depth(&self) -> usize {
        self.max_nesting_depth
    }
}
