//! Attribute paths
//!
//! Addresses a node inside a resource tree. Rendered the way an operator
//! would point at it: `origin.servers["a.com"].port`, `rewrite[1].flag`.

use std::fmt;

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Named attribute of an object
    Attr(String),
    /// Entry of a keyed map
    Key(String),
    /// Position in a list or set
    Index(usize),
}

/// Path from the resource root to a node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrPath {
    segments: Vec<Segment>,
}

impl AttrPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted attribute path such as `cache.valid.2xx`.
    ///
    /// Map keys and indices cannot be expressed in this form; build those
    /// with [`AttrPath::key`] and [`AttrPath::index`].
    pub fn parse(dotted: &str) -> Self {
        let segments = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| Segment::Attr(s.to_string()))
            .collect();
        Self { segments }
    }

    pub fn attr(&self, name: &str) -> Self {
        self.push(Segment::Attr(name.to_string()))
    }

    pub fn key(&self, key: &str) -> Self {
        self.push(Segment::Key(key.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Attr(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Attr(name) => write!(f, ".{}", name)?,
                Segment::Key(key) => write!(f, "[{:?}]", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mixes_attrs_keys_and_indices() {
        let path = AttrPath::root()
            .attr("limitations")
            .attr("geo")
            .index(0)
            .attr("exclude")
            .index(1)
            .attr("country");
        assert_eq!(path.to_string(), "limitations.geo[0].exclude[1].country");

        let path = AttrPath::root().attr("origin").attr("servers").key("a.com").attr("port");
        assert_eq!(path.to_string(), "origin.servers[\"a.com\"].port");
    }

    #[test]
    fn test_root_renders_as_dollar() {
        assert_eq!(AttrPath::root().to_string(), "$");
        assert!(AttrPath::parse("").is_root());
    }

    #[test]
    fn test_parse_dotted() {
        let path = AttrPath::parse("cache.valid.2xx");
        assert_eq!(path, AttrPath::root().attr("cache").attr("valid").attr("2xx"));
    }
}
