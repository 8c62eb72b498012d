//! Path Keys
//!
//! A path key addresses a location in the observed graph relative to the
//! root, e.g. `b.c`, `b.1` or `f.0.g`.
//!
//! # Representation
//!
//! Internally a [`PathKey`] is an ordered list of [`Segment`]s: property
//! names and array indices. The dotted string form only exists at the
//! subscription boundary, where listeners are registered and looked up by it.
//! Two keys address the same subscriptions iff their string forms are equal,
//! so `Segment::Index(1)` and `Segment::Key("1")` are interchangeable there.
//!
//! Property names may not contain [`SEPARATOR`]; the observable rejects them
//! so that the string form always splits back into the same segments.

mod flatten;

use std::fmt;

use smallvec::SmallVec;

pub use flatten::{extract, flatten, resolve, FlatMap};

/// Separator between segments in the string form of a path key.
pub const SEPARATOR: char = '.';

/// One step of a path: a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    /// Parse a single segment. Canonical decimal integers (no sign, no leading
    /// zeros) become indices; everything else is a key.
    pub fn parse(raw: &str) -> Self {
        let canonical = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw == "0" || !raw.starts_with('0'));
        if canonical {
            if let Ok(index) = raw.parse() {
                return Segment::Index(index);
            }
        }
        Segment::Key(raw.to_string())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            Segment::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(raw: &str) -> Self {
        Segment::parse(raw)
    }
}

impl From<String> for Segment {
    fn from(raw: String) -> Self {
        Segment::parse(&raw)
    }
}

impl From<&String> for Segment {
    fn from(raw: &String) -> Self {
        Segment::parse(raw)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl From<u32> for Segment {
    fn from(index: u32) -> Self {
        Segment::Index(index as usize)
    }
}

impl From<i32> for Segment {
    fn from(index: i32) -> Self {
        match usize::try_from(index) {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Key(index.to_string()),
        }
    }
}

/// Address of a location in the observed graph. The empty key is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathKey(SmallVec<[Segment; 4]>);

impl PathKey {
    pub fn root() -> Self {
        Self::default()
    }

    /// Split a dotted path into segments. The empty string is the root.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self(path.split(SEPARATOR).map(Segment::parse).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// The key one level below this one.
    pub fn child(&self, segment: impl Into<Segment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// The key with the final segment removed. `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.iter().cloned().collect()))
    }

    /// This key followed by each strict ancestor, nearest first. The root
    /// itself is never yielded.
    pub fn ancestors(&self) -> impl Iterator<Item = PathKey> + '_ {
        (1..=self.0.len())
            .rev()
            .map(move |n| Self(self.0[..n].iter().cloned().collect()))
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for PathKey {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl FromIterator<Segment> for PathKey {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
