use crate::buffer;
use crate::protocol::{ContentType, Disposition, Headers, ParseError, Segment};
use bytes::Bytes;

/// One section of a multipart body: its header block and decoded content.
#[derive(Debug, Clone)]
pub struct Part {
    segment: Segment,
    content: Bytes,
}

impl Part {
    pub fn new(segment: Segment, content: Bytes) -> Self {
        Self { segment, content }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn headers(&self) -> &Headers {
        self.segment.headers()
    }

    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.segment.header(name)
    }

    pub fn content_type(&self) -> Option<&ContentType> {
        self.segment.content_type()
    }

    pub fn disposition(&self) -> Option<&Disposition> {
        self.segment.disposition()
    }

    /// The form field name from `Content-Disposition`.
    pub fn name(&self) -> Option<&str> {
        self.disposition().and_then(Disposition::name)
    }

    pub fn file_name(&self) -> Option<&str> {
        self.disposition().and_then(Disposition::file_name)
    }

    /// Parts without a disposition are treated as files.
    pub fn is_file(&self) -> bool {
        self.disposition().is_none_or(Disposition::is_file)
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    /// Decodes the content with the declared charset, UTF-8 when none is declared.
    pub fn text(&self) -> Result<String, ParseError> {
        let charset = self.content_type().and_then(ContentType::charset).unwrap_or("utf-8");
        buffer::decode(&self.content, charset)
    }
}

/// The parts of a multipart body, in the order they appeared, plus the raw
/// bytes they were decoded from.
#[derive(Debug, Clone, Default)]
pub struct PartData {
    parts: Vec<Part>,
    body: Bytes,
}

impl PartData {
    pub fn new(parts: Vec<Part>, body: Bytes) -> Self {
        Self { parts, body }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    /// The last part whose disposition carries `name`.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().rev().find(|part| part.name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The raw bytes consumed for the whole series.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
