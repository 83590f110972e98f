//! Normalized path of a request target.

use crate::protocol::ParseError;

/// The path of a request target with `.` and `..` segments resolved and
/// repeated slashes collapsed, so `/usr/../etc/./` reads as `/etc/`.
///
/// A path that climbs above the root is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    path: String,
    segments: Vec<String>,
}

impl RequestPath {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(ParseError::InvalidUri);
                    }
                }
                _ => segments.push(segment),
            }
        }

        let directory = matches!(raw.rsplit('/').next(), Some("" | "." | ".."));
        let mut path = String::with_capacity(raw.len() + 1);
        path.push('/');
        path.push_str(&segments.join("/"));
        if directory && !segments.is_empty() {
            path.push('/');
        }

        Ok(Self { path, segments: segments.into_iter().map(str::to_owned).collect() })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path made of `count` segments starting at segment `from`.
    pub fn sub_path(&self, from: usize, count: usize) -> Option<String> {
        let end = from.checked_add(count)?;
        self.segments.get(from..end).map(|segments| format!("/{}", segments.join("/")))
    }

    /// The last segment without its path parameters.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|segment| segment.split(';').next().unwrap_or_default())
    }

    /// What follows the last `.` of the name, `file.en_US.html` has `html`.
    pub fn extension(&self) -> Option<&str> {
        self.name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension)
            .filter(|extension| !extension.is_empty())
    }

    /// The deepest directory, always ending with `/`.
    pub fn directory(&self) -> &str {
        self.path.rfind('/').map_or("/", |end| &self.path[..=end])
    }

    /// The rest of this path below the directory of `base`, starting with `/`.
    pub fn relative(&self, base: &RequestPath) -> Option<&str> {
        let directory = base.directory();
        self.path.starts_with(directory).then(|| &self.path[directory.len() - 1..])
    }
}
