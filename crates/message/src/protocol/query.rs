//! Query string of a request target.
//!
//! The query is decoded as `application/x-www-form-urlencoded`: pairs are
//! split on `&`, names and values are percent-decoded and `+` reads as a space.

use crate::protocol::ParseError;
use tracing::debug;

/// Decoded query parameters in the order they were sent.
///
/// A name may appear more than once, [`get`](Self::get) returns the first
/// value and [`get_all`](Self::get_all) every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    /// Decodes `raw`, the part of the target after `?`.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).map_err(|e| {
            debug!(cause = %e, "undecodable query");
            ParseError::InvalidUri
        })?;
        Ok(Self { pairs })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.pairs.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_values() {
        let query = Query::parse("a=1&b=2&a=3").unwrap();
        assert_eq!(query.len(), 3);
        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(query.get("b"), Some("2"));
        assert_eq!(query.get("c"), None);
    }

    #[test]
    fn test_decoding() {
        let query = Query::parse("name=Niall+Gallagher&path=%2Fusr%2Fbin&empty=&flag").unwrap();
        assert_eq!(query.get("name"), Some("Niall Gallagher"));
        assert_eq!(query.get("path"), Some("/usr/bin"));
        assert_eq!(query.get("empty"), Some(""));
        assert!(query.contains("flag"));
        assert_eq!(query.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["name", "path", "empty", "flag"]);
    }

    #[test]
    fn test_empty() {
        assert!(Query::parse("").unwrap().is_empty());
        assert!(Query::parse("&&").unwrap().is_empty());
    }
}
