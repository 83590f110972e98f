//! Shared fixtures for the decoder benchmarks.

/// A request captured in `resources/`.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static [u8],
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static [u8]) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static [u8] {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// How a test file is handed to the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The whole file arrives at once.
    Whole,
    /// The file arrives in fragments of the given size, as from a slow socket.
    Fragments(usize),
}

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    delivery: Delivery,
}

impl TestCase {
    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self { name, file, delivery: Delivery::Whole }
    }

    pub fn fragmented(name: &'static str, file: TestFile, size: usize) -> Self {
        Self { name, file, delivery: Delivery::Fragments(size.max(1)) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    /// The fragments of the file in arrival order.
    pub fn fragments(&self) -> impl Iterator<Item = &'static [u8]> {
        let size = match self.delivery {
            Delivery::Whole => self.file.len().max(1),
            Delivery::Fragments(size) => size,
        };
        self.file.content().chunks(size)
    }
}
