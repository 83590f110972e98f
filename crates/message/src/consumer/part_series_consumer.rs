//! Consumer for a whole `multipart/*` body.
//!
//! A series is a run of entries, each opened by a boundary marker:
//!
//! ```text
//! --AaB03x CRLF headers CRLF content CRLF --AaB03x CRLF ... CRLF --AaB03x-- CRLF
//! ```
//!
//! The [`BoundaryConsumer`] matches each marker and the [`PartConsumer`]
//! matches the entry after it, until the terminal marker is seen. The
//! outermost series also records every byte it consumed, so the raw body can
//! be handed out next to the parts.

use super::{BoundaryConsumer, Consumer, PartConsumer, Poison};
use crate::buffer::{Allocator, Buffer};
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Boundary, ParseError, Part, PartData};
use std::io;
use std::mem;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
enum State {
    Entry,
    Part(PartConsumer),
    Done,
}

/// Consumes a multipart series into a flat list of [`Part`]s.
#[derive(Debug)]
pub struct PartSeriesConsumer {
    state: State,
    entry: BoundaryConsumer,
    allocator: Arc<dyn Allocator>,
    config: ConsumerConfig,
    depth: usize,
    parts: Vec<Part>,
    body: Option<Buffer>,
    poison: Poison,
}

impl PartSeriesConsumer {
    /// Creates a consumer for an outermost series delimited by `boundary`.
    pub fn new(allocator: Arc<dyn Allocator>, boundary: Boundary, config: ConsumerConfig) -> Self {
        let body = allocator.allocate();
        let mut series = Self::nested(allocator, boundary, config, 0);
        series.body = Some(body);
        series
    }

    /// Creates a consumer for a series inside a part, it does not record its
    /// raw bytes since the outermost series already does.
    pub(crate) fn nested(allocator: Arc<dyn Allocator>, boundary: Boundary, config: ConsumerConfig, depth: usize) -> Self {
        Self {
            state: State::Entry,
            entry: BoundaryConsumer::new(boundary),
            allocator,
            config,
            depth,
            parts: Vec::new(),
            body: None,
            poison: Poison::default(),
        }
    }

    /// True once the terminal boundary has been consumed.
    pub fn is_end(&self) -> bool {
        self.entry.is_end() && self.is_finished()
    }

    /// The parts completed so far, in stream order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn take_parts(&mut self) -> Vec<Part> {
        mem::take(&mut self.parts)
    }

    /// The raw bytes consumed so far, empty for a nested series.
    pub fn body(&self) -> &[u8] {
        self.body.as_ref().map(Buffer::as_bytes).unwrap_or_default()
    }

    pub fn into_part_data(self) -> PartData {
        let body = self.body.map(Buffer::freeze).unwrap_or_default();
        PartData::new(self.parts, body)
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        loop {
            match &mut self.state {
                State::Entry => {
                    self.entry.consume(cursor)?;
                    if !self.entry.is_finished() {
                        return Ok(());
                    }
                    if self.entry.is_end() {
                        trace!(depth = self.depth, parts = self.parts.len(), "finished multipart series");
                        self.state = State::Done;
                        return Ok(());
                    }

                    let boundary = self.entry.boundary().clone();
                    self.entry.clear();
                    self.state = State::Part(PartConsumer::new(self.allocator.clone(), boundary, self.config, self.depth));
                }
                State::Part(part) => {
                    part.consume(cursor)?;
                    if !part.is_finished() {
                        return Ok(());
                    }
                    self.parts.append(&mut part.take_parts());
                    self.state = State::Entry;
                }
                State::Done => return Ok(()),
            }
        }
    }
}

impl Consumer for PartSeriesConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.is_finished() {
            return Ok(());
        }

        let result = match self.body.take() {
            Some(mut body) => {
                let mut recording = RecordingCursor { inner: cursor, record: &mut body, failure: None };
                let result = self.advance(&mut recording);
                let failure = recording.failure.take();
                self.body = Some(body);
                match failure {
                    Some(e) => Err(e),
                    None => result,
                }
            }
            None => self.advance(cursor),
        };
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

/// Copies every byte read through it into `record`, forgetting the bytes
/// pushed back, so `record` ends up holding exactly what was consumed.
///
/// Consumers only ever push back the bytes they read last. A record that
/// outgrows its buffer stops the read and keeps the error in `failure`.
struct RecordingCursor<'a, C: ?Sized> {
    inner: &'a mut C,
    record: &'a mut Buffer,
    failure: Option<ParseError>,
}

impl<C: Cursor + ?Sized> Cursor for RecordingCursor<'_, C> {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn ready(&self) -> usize {
        self.inner.ready()
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let count = self.inner.read(dst)?;
        if let Err(e) = self.record.append(&dst[..count]) {
            self.failure = Some(e);
            return Err(io::Error::other("raw body record rejected"));
        }
        Ok(count)
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.push(bytes)?;
        self.record.truncate(self.record.len().saturating_sub(bytes.len()));
        Ok(())
    }
}
