use super::{BodyConsumer, Consumer, Poison, RequestConsumer};
use crate::buffer::Allocator;
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Entity, ParseError, RequestHeader};
use std::mem;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
enum State {
    Header(RequestConsumer),
    Body(Box<RequestHeader>, BodyConsumer),
    Done(Box<Entity>),
    Taken,
}

/// Consumes a complete request, the header first and then the body its
/// framing headers call for.
#[derive(Debug)]
pub struct EntityConsumer {
    state: State,
    allocator: Arc<dyn Allocator>,
    config: ConsumerConfig,
    poison: Poison,
}

impl EntityConsumer {
    pub fn new(allocator: Arc<dyn Allocator>, config: ConsumerConfig) -> Self {
        Self { state: State::Header(RequestConsumer::new(config)), allocator, config, poison: Poison::default() }
    }

    /// True until the first byte of a request line arrived.
    pub fn is_idle(&self) -> bool {
        matches!(&self.state, State::Header(request) if request.is_idle())
    }

    pub fn entity(&self) -> Option<&Entity> {
        match &self.state {
            State::Done(entity) => Some(&**entity),
            _ => None,
        }
    }

    /// Takes the finished entity out, `None` before the consumer finished.
    pub fn take_entity(&mut self) -> Option<Entity> {
        match mem::replace(&mut self.state, State::Taken) {
            State::Done(entity) => Some(*entity),
            state => {
                self.state = state;
                None
            }
        }
    }

    pub fn into_entity(mut self) -> Option<Entity> {
        self.take_entity()
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        loop {
            match &mut self.state {
                State::Header(request) => {
                    request.consume(cursor)?;
                    let Some(header) = request.take_header() else {
                        return Ok(());
                    };

                    if header.is_expect_continue() {
                        debug!(uri = header.target(), "request expects 100-continue");
                    }
                    let body = BodyConsumer::for_request(&header, self.allocator.clone(), self.config)?;
                    self.state = State::Body(Box::new(header), body);
                }
                State::Body(_, body) => {
                    body.consume(cursor)?;
                    if !body.is_finished() {
                        return Ok(());
                    }

                    if let State::Body(header, body) = mem::replace(&mut self.state, State::Taken) {
                        let (body, trailers) = body.into_parts();
                        self.state = State::Done(Box::new(Entity::new(*header, body, trailers)));
                    }
                }
                State::Done(_) | State::Taken => return Ok(()),
            }
        }
    }
}

impl Consumer for EntityConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, State::Done(_) | State::Taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArrayAllocator;
    use crate::consumer::test_support::feed;
    use crate::protocol::Body;
    use indoc::indoc;

    fn consumer() -> EntityConsumer {
        EntityConsumer::new(Arc::new(ArrayAllocator::default()), ConsumerConfig::default())
    }

    #[test]
    fn test_fixed_body() {
        let source = "POST /submit HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello worldGET";
        for step in [1, 3, source.len()] {
            let mut entity = consumer();
            let rest = feed(&mut entity, source.as_bytes(), step).unwrap();
            assert_eq!(&rest[..], b"GET");

            let entity = entity.into_entity().unwrap();
            assert_eq!(entity.header().target(), "/submit");
            assert_eq!(entity.body().content().unwrap().as_ref(), b"hello world");
        }
    }

    #[test]
    fn test_multipart_body() {
        let source = indoc! {"
            POST /upload HTTP/1.1\r
            Content-Type: multipart/form-data; boundary=AaB03x\r
            Transfer-Encoding: chunked\r
            Expect: 100-continue\r
            \r
            10\r
            --AaB03x\r
            Conten\r
            31\r
            t-Disposition: form-data; name=\"field\"\r
            \r
            value\r
            \r
            c\r
            --AaB03x--\r
            \r
            0\r
            \r
        "};

        let mut entity = consumer();
        feed(&mut entity, source.as_bytes(), 5).unwrap();
        let entity = entity.into_entity().unwrap();
        assert!(entity.header().is_expect_continue());

        let Body::Parts(parts) = entity.body() else {
            panic!("expected a multipart body");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts.part("field").unwrap().text().unwrap(), "value");
    }

    #[test]
    fn test_idle_and_take() {
        let mut entity = consumer();
        assert!(entity.is_idle());
        assert!(entity.take_entity().is_none());

        feed(&mut entity, b"GET / HTTP/1.1\r\n\r\n", 4).unwrap();
        assert!(!entity.is_idle());
        assert!(entity.is_finished());
        assert!(entity.entity().unwrap().body().is_empty());
        assert!(entity.take_entity().is_some());
        assert!(entity.take_entity().is_none());
    }
}
