//! Consumer for the boundary marker that opens every multipart entry.
//!
//! The marker is `--` followed by the boundary and then either a line break
//! (another part follows) or `--` and a line break (the series is over).
//! Bytes are taken one at a time so nothing after the marker is ever read.

use super::{Consumer, Poison, suspend};
use crate::cursor::Cursor;
use crate::protocol::{Boundary, ParseError};
use crate::scan::is_space;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Matching `--boundary`
    Marker,
    /// Right after the boundary, a dash or the line break decides the kind
    Suffix,
    /// Read the second dash of the terminal form
    Dash,
    /// Skip transport padding before the line break
    Padding,
    /// Read LF after CR
    Lf,
    Done,
}

/// Matches `--boundary` followed by `CRLF` or `--CRLF`.
#[derive(Debug, Clone)]
pub struct BoundaryConsumer {
    boundary: Boundary,
    matched: usize,
    stage: Stage,
    end: bool,
    poison: Poison,
}

impl BoundaryConsumer {
    pub fn new(boundary: Boundary) -> Self {
        Self { boundary, matched: 0, stage: Stage::Marker, end: false, poison: Poison::default() }
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// True once the terminal `--boundary--` form has been matched.
    pub fn is_end(&self) -> bool {
        self.end
    }

    /// Resets the consumer so it can match the next marker of the same series.
    pub fn clear(&mut self) {
        self.matched = 0;
        self.stage = Stage::Marker;
        self.end = false;
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        while self.stage != Stage::Done {
            let Some(byte) = cursor.read_byte()? else {
                // a terminal marker may be the very last bytes of a bounded body
                if self.end && !cursor.is_open() {
                    self.stage = Stage::Done;
                    break;
                }
                return suspend(&*cursor);
            };

            self.stage = match self.stage {
                Stage::Marker => {
                    let marker = self.boundary.marker();
                    if byte != marker[self.matched] {
                        return Err(ParseError::invalid_boundary(format!(
                            "unexpected byte {byte:#04x} at offset {} of boundary marker",
                            self.matched
                        )));
                    }
                    self.matched += 1;
                    if self.matched == marker.len() { Stage::Suffix } else { Stage::Marker }
                }
                Stage::Suffix => match byte {
                    b'-' => Stage::Dash,
                    b'\r' => Stage::Lf,
                    b if is_space(b) => Stage::Padding,
                    _ => return Err(ParseError::invalid_boundary("boundary marker not followed by line break")),
                },
                Stage::Dash => match byte {
                    b'-' => {
                        self.end = true;
                        Stage::Padding
                    }
                    _ => return Err(ParseError::invalid_boundary("incomplete terminal boundary")),
                },
                Stage::Padding => match byte {
                    b'\r' => Stage::Lf,
                    b if is_space(b) => Stage::Padding,
                    _ => return Err(ParseError::invalid_boundary("boundary marker not followed by line break")),
                },
                Stage::Lf => match byte {
                    b'\n' => Stage::Done,
                    _ => return Err(ParseError::invalid_boundary("boundary line break missing LF")),
                },
                Stage::Done => Stage::Done,
            };
        }

        trace!(end = self.end, "matched boundary marker");
        Ok(())
    }
}

impl Consumer for BoundaryConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.stage == Stage::Done {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}
