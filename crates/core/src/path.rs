//! Field paths into error entities and value graphs
//!
//! A [`FieldPath`] reads a diagnostic field back out of an
//! [`AppError`](crate::AppError) or a value graph the way chained property
//! access would: `extra.deep.error`, `causes[0]`, `payload.items[2][0]`.
//!
//! A path is a list of dot-separated fields, each optionally followed by
//! one or more `[n]` indexes. On an error entity, `code`, `message` and
//! `stack` resolve to the typed fields; every other name resolves against
//! the extra fields. The empty string is the root itself.
//!
//! [`PathSegment`] doubles as the address of an entry inside one container,
//! which is how the sanitizer names the entries it rewrites.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::value::Value;

/// Reasons a field path fails to parse
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// A dot-separated part has no field name
    #[error("empty field name in part {part}")]
    EmptyField {
        /// Zero-based part number
        part: usize,
    },
    /// A field name contains a character that is not allowed
    #[error("invalid character {found:?} in field `{field}`")]
    BadField {
        /// The offending field name
        field: String,
        /// First character that is not allowed
        found: char,
    },
    /// An index suffix is not `[n]` with `n` a non-negative integer
    #[error("malformed index `{text}` in part {part}")]
    BadIndex {
        /// Zero-based part number
        part: usize,
        /// Unparsed remainder of the part
        text: String,
    },
}

/// Address of one entry inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key, or field of an error entity
    Key(String),
    /// Array position
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, ".{}", k),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A chain of field and index accesses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the root value itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Segments in access order
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the empty path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a field access
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index access
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Follow this path from `root`.
    ///
    /// Returns `None` when an access misses or hits the wrong kind of value.
    /// Containers come back as shared handles, not copies.
    pub fn resolve(&self, root: &Value) -> Option<Value> {
        self.segments
            .iter()
            .try_fold(root.clone(), |current, segment| match segment {
                PathSegment::Key(key) => current.get(key),
                PathSegment::Index(idx) => current.at(*idx),
            })
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '$')
}

/// Parse the `[a][b]...` tail of one part into index segments.
fn parse_indexes(
    part: usize,
    mut rest: &str,
    out: &mut Vec<PathSegment>,
) -> Result<(), PathParseError> {
    let malformed = |text: &str| PathParseError::BadIndex {
        part,
        text: text.to_string(),
    };
    while !rest.is_empty() {
        let (digits, tail) = rest
            .strip_prefix('[')
            .and_then(|r| r.split_once(']'))
            .ok_or_else(|| malformed(rest))?;
        let idx = digits.parse::<usize>().map_err(|_| malformed(rest))?;
        out.push(PathSegment::Index(idx));
        rest = tail;
    }
    Ok(())
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        if s.is_empty() {
            return Ok(FieldPath { segments });
        }

        for (part, text) in s.split('.').enumerate() {
            let (field, indexes) = text.split_at(text.find('[').unwrap_or(text.len()));
            if field.is_empty() {
                // Only the first part may start with an index: `[0].message`
                if part > 0 || indexes.is_empty() {
                    return Err(PathParseError::EmptyField { part });
                }
            } else if let Some(found) = field.chars().find(|c| !is_field_char(*c)) {
                return Err(PathParseError::BadField {
                    field: field.to_string(),
                    found,
                });
            } else {
                segments.push(PathSegment::Key(field.to_string()));
            }
            parse_indexes(part, indexes, &mut segments)?;
        }

        Ok(FieldPath { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => f.write_str(k)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}
