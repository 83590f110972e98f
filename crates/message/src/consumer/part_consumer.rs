use super::{Consumer, ContentConsumer, PartSeriesConsumer, Poison, SegmentConsumer, TokenConsumer};
use crate::buffer::Allocator;
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Boundary, ContentType, ParseError, Part, Segment};
use crate::utils::ensure;
use std::mem;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
enum State {
    Header(SegmentConsumer),
    Content { segment: Segment, content: ContentConsumer, line: TokenConsumer },
    Series(Box<PartSeriesConsumer>),
    Done,
}

/// Consumes one entry of a multipart series: the part headers and then
/// either the content up to the next delimiter or, for a `multipart/*` part
/// with its own boundary, a nested series.
///
/// A nested series is flattened, its parts are handed out in place of the
/// container part.
#[derive(Debug)]
pub struct PartConsumer {
    state: State,
    allocator: Arc<dyn Allocator>,
    boundary: Boundary,
    config: ConsumerConfig,
    depth: usize,
    parts: Vec<Part>,
    poison: Poison,
}

impl PartConsumer {
    /// Creates a consumer for an entry of the series delimited by `boundary`,
    /// nested `depth` levels below the outermost series.
    pub fn new(allocator: Arc<dyn Allocator>, boundary: Boundary, config: ConsumerConfig, depth: usize) -> Self {
        Self {
            state: State::Header(SegmentConsumer::new(config)),
            allocator,
            boundary,
            config,
            depth,
            parts: Vec::new(),
            poison: Poison::default(),
        }
    }

    /// The parts produced by this entry, one for plain content.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn take_parts(&mut self) -> Vec<Part> {
        mem::take(&mut self.parts)
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        loop {
            match &mut self.state {
                State::Header(header) => {
                    header.consume(cursor)?;
                    let Some(segment) = header.take_segment() else {
                        return Ok(());
                    };
                    self.state = self.body_state(segment)?;
                }
                State::Content { segment, content, line } => {
                    content.consume(cursor)?;
                    if !content.is_finished() {
                        return Ok(());
                    }
                    line.consume(cursor)?;
                    if !line.is_finished() {
                        return Ok(());
                    }

                    let part = Part::new(mem::take(segment), content.take());
                    self.parts.push(part);
                    self.state = State::Done;
                }
                State::Series(series) => {
                    series.consume(cursor)?;
                    if !series.is_finished() {
                        return Ok(());
                    }
                    self.parts.append(&mut series.take_parts());
                    self.state = State::Done;
                }
                State::Done => return Ok(()),
            }
        }
    }

    fn body_state(&self, segment: Segment) -> Result<State, ParseError> {
        let nested = segment
            .content_type()
            .filter(|content_type| content_type.is_multipart())
            .and_then(ContentType::boundary)
            .map(Boundary::new)
            .transpose()?;

        let Some(boundary) = nested else {
            let content = ContentConsumer::new(&*self.allocator, self.boundary.clone());
            return Ok(State::Content { segment, content, line: TokenConsumer::line() });
        };

        let max_depth = self.config.get_max_nesting_depth();
        ensure!(self.depth < max_depth, ParseError::TooDeepNesting { max_depth });

        debug!(depth = self.depth + 1, ?boundary, "entering nested multipart series");
        let series = PartSeriesConsumer::nested(self.allocator.clone(), boundary, self.config, self.depth + 1);
        Ok(State::Series(Box::new(series)))
    }
}

impl Consumer for PartConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }
}
