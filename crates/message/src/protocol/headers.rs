//! Ordered, case-insensitive header multimap.

use crate::protocol::ParseError;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::time::SystemTime;

const MAX_QUALITY: u16 = 1000;

/// Header fields in the order they appeared on the wire.
///
/// Names are case-insensitive and a name may occur more than once, every
/// occurrence is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(HeaderName, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: HeaderName, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    /// Folds a continuation line into the last value with a single space.
    pub fn fold(&mut self, continuation: &str) -> Result<(), ParseError> {
        let (_, value) = self
            .entries
            .last_mut()
            .ok_or_else(|| ParseError::invalid_header("continuation line before the first header"))?;

        let continuation = continuation.trim();
        if continuation.is_empty() {
            return Ok(());
        }

        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(continuation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.entries.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.get(name).is_some()
    }

    /// The first value of `name`.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.get_all(name).next()
    }

    /// The value of the `index`-th occurrence of `name`.
    pub fn get_nth(&self, name: impl AsRef<str>, index: usize) -> Option<&str> {
        self.get_all(name).nth(index)
    }

    pub fn get_all(&self, name: impl AsRef<str>) -> impl Iterator<Item = &str> {
        let name = name.as_ref().to_owned();
        self.entries
            .iter()
            .filter(move |(key, _)| key.as_str().eq_ignore_ascii_case(&name))
            .map(|(_, value)| value.as_str())
    }

    /// Distinct names in the order they first appeared.
    pub fn names(&self) -> Vec<&HeaderName> {
        let mut names: Vec<&HeaderName> = Vec::with_capacity(self.entries.len());
        for (name, _) in &self.entries {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// The comma separated list values of `name`, ordered by their `q` parameter.
    ///
    /// Every occurrence of the header contributes to the list. Items with
    /// `q=0` are dropped, the `q` parameter itself is stripped and items with
    /// equal quality keep their order.
    pub fn values(&self, name: impl AsRef<str>) -> Vec<String> {
        let mut items: Vec<(u16, String)> = self
            .get_all(name)
            .flat_map(split_list)
            .filter_map(|item| {
                let (value, quality) = strip_quality(item);
                (quality > 0 && !value.is_empty()).then_some((quality, value))
            })
            .collect();

        items.sort_by(|a, b| b.0.cmp(&a.0));
        items.into_iter().map(|(_, value)| value).collect()
    }

    /// Parses the first value of `name` as an integer, nothing is cached.
    pub fn integer(&self, name: impl AsRef<str>) -> Result<Option<i64>, ParseError> {
        let name = name.as_ref();
        self.get(name)
            .map(|value| {
                value.trim().parse::<i64>().map_err(|e| ParseError::invalid_header(format!("{name} value {value} is not an integer: {e}")))
            })
            .transpose()
    }

    /// Parses the first value of `name` as an HTTP date, nothing is cached.
    pub fn date(&self, name: impl AsRef<str>) -> Result<Option<SystemTime>, ParseError> {
        let name = name.as_ref();
        self.get(name)
            .map(|value| {
                httpdate::parse_http_date(value.trim())
                    .map_err(|e| ParseError::invalid_header(format!("{name} value {value} is not a date: {e}")))
            })
            .transpose()
    }

    /// Copies the fields into an `http::HeaderMap`.
    pub fn to_header_map(&self) -> Result<HeaderMap, ParseError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| ParseError::invalid_header(format!("{name}: {e}")))?;
            map.append(name.clone(), value);
        }
        Ok(map)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a HeaderName, &'a str);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Splits a list value on commas that are not inside a quoted string.
fn split_list(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(value[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    items.push(value[start..].trim());
    items.retain(|item| !item.is_empty());
    items
}

/// Removes a `q` parameter from a list item, returning the item and its quality in thousandths.
fn strip_quality(item: &str) -> (String, u16) {
    let mut quality = MAX_QUALITY;
    let mut kept: Vec<&str> = Vec::new();

    for (index, param) in item.split(';').enumerate() {
        if index > 0 {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = parse_quality(value.trim());
                    continue;
                }
            }
        }
        kept.push(param);
    }

    (kept.join(";").trim().trim_end_matches(';').trim_end().to_string(), quality)
}

fn parse_quality(value: &str) -> u16 {
    match value.parse::<f32>() {
        Ok(q) if (0.0..=1.0).contains(&q) => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is within 0..=1000")]
            let thousandths = (q * 1000.0).round() as u16;
            thousandths
        }
        _ => MAX_QUALITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> Headers {
        let mut headers = Headers::new();
        for &(name, value) in pairs {
            headers.append(HeaderName::from_static(name), value);
        }
        headers
    }

    #[test]
    fn test_case_insensitive_multimap() {
        let headers = headers(&[("cookie", "a=1"), ("host", "example.com"), ("cookie", "b=2")]);

        assert_eq!(headers.get("Cookie"), Some("a=1"));
        assert_eq!(headers.get_nth("COOKIE", 1), Some("b=2"));
        assert_eq!(headers.get_nth("cookie", 2), None);
        assert_eq!(headers.get_all("cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
        assert_eq!(headers.get("Pragma"), None);
        assert_eq!(headers.names().iter().map(|n| n.as_str()).collect::<Vec<_>>(), vec!["cookie", "host"]);
    }

    #[test]
    fn test_fold() {
        let mut headers = headers(&[("accept", "image/gif;q=1.0,")]);
        headers.fold(" \t image/jpeg;q=0.8, ").unwrap();
        assert_eq!(headers.get("accept"), Some("image/gif;q=1.0, image/jpeg;q=0.8,"));

        assert!(Headers::new().fold(" orphan").is_err());
    }

    #[test]
    fn test_values_ordered_by_quality() {
        let headers = headers(&[("accept", "image/gif;q=1.0, image/jpeg;q=0.8, image/png; q=1.0,*;q=0.1")]);
        assert_eq!(headers.values("Accept"), vec!["image/gif", "image/png", "image/jpeg", "*"]);
    }

    #[test]
    fn test_values_drop_zero_and_keep_params() {
        let headers = headers(&[
            ("accept-language", "fr;q=0.1, en-us;q=0.4, en-gb; q=0.8, en;q=0.7"),
            ("accept", "text/html;level=1;q=0.5, text/plain;q=0, \"a,b\""),
        ]);

        assert_eq!(headers.values("accept-language"), vec!["en-gb", "en", "en-us", "fr"]);
        assert_eq!(headers.values("accept"), vec!["\"a,b\"", "text/html;level=1"]);
    }

    #[test]
    fn test_typed_values() {
        let headers = headers(&[
            ("content-length", " 42 "),
            ("max-forwards", "ten"),
            ("date", "Sun, 06 Nov 1994 08:49:37 GMT"),
        ]);

        assert_eq!(headers.integer("Content-Length").unwrap(), Some(42));
        assert_eq!(headers.integer("Age").unwrap(), None);
        assert!(headers.integer("Max-Forwards").is_err());

        let date = headers.date("Date").unwrap().unwrap();
        assert_eq!(date, httpdate::parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT").unwrap());
    }

    #[test]
    fn test_to_header_map() {
        let headers = headers(&[("cookie", "a=1"), ("cookie", "b=2")]);
        let map = headers.to_header_map().unwrap();
        assert_eq!(map.get_all("cookie").iter().count(), 2);
    }
}
