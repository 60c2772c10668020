//! Structural line types.

use std::fmt;

/// LineRole is the nesting role of a structural line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// A scalar, optionally named.
    Plain,
    /// Opens a map or list.
    Open,
    /// Closes the innermost open map or list.
    Close,
}

/// ChangeMarker records which side of the diff a line belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeMarker {
    /// Present on both sides.
    #[default]
    None,
    /// Present only on the desired side.
    Added,
    /// Present only on the live side.
    Removed,
}

impl ChangeMarker {
    pub fn symbol(self) -> char {
        match self {
            ChangeMarker::None => ' ',
            ChangeMarker::Added => '+',
            ChangeMarker::Removed => '-',
        }
    }
}

/// StructuralLine is one line of a serialized object tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralLine {
    pub role: LineRole,
    pub marker: ChangeMarker,
    /// Field name when the line sits inside a map.
    pub name: Option<String>,
    /// Scalar token, or the delimiter for open and close lines.
    pub token: String,
}

impl StructuralLine {
    pub fn plain(marker: ChangeMarker, name: Option<&str>, token: impl Into<String>) -> Self {
        StructuralLine {
            role: LineRole::Plain,
            marker,
            name: name.map(str::to_string),
            token: token.into(),
        }
    }

    pub fn open(marker: ChangeMarker, name: Option<&str>, delimiter: impl Into<String>) -> Self {
        StructuralLine {
            role: LineRole::Open,
            marker,
            name: name.map(str::to_string),
            token: delimiter.into(),
        }
    }

    pub fn close(marker: ChangeMarker, delimiter: impl Into<String>) -> Self {
        StructuralLine {
            role: LineRole::Close,
            marker,
            name: None,
            token: delimiter.into(),
        }
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Two lines address the same field when both are named alike.
    pub fn same_field(&self, other: &StructuralLine) -> bool {
        self.name.is_some() && self.name == other.name
    }

    /// Renders the line at the given depth with an explicit marker.
    ///
    /// The marker may differ from `self.marker`: a removal that is kept
    /// because the desired side never set the field renders as unchanged.
    pub fn render(&self, marker: ChangeMarker, depth: usize) -> String {
        let indent = "  ".repeat(depth);
        match &self.name {
            Some(name) => format!("{}{}{}: {}", marker.symbol(), indent, name, self.token),
            None => format!("{}{}{}", marker.symbol(), indent, self.token),
        }
    }
}

impl fmt::Display for StructuralLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(self.marker, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_named_and_bare() {
        let named = StructuralLine::plain(ChangeMarker::Removed, Some("replicas"), "3");
        assert_eq!(named.render(ChangeMarker::Removed, 2), "-    replicas: 3");
        assert_eq!(named.render(ChangeMarker::None, 1), "   replicas: 3");

        let bare = StructuralLine::plain(ChangeMarker::Added, None, "\"a\"");
        assert_eq!(format!("{}", bare), "+\"a\"");
    }

    #[test]
    fn test_same_field() {
        let a = StructuralLine::plain(ChangeMarker::Removed, Some("x"), "1");
        let b = StructuralLine::plain(ChangeMarker::Added, Some("x"), "2");
        let c = StructuralLine::plain(ChangeMarker::Added, None, "2");
        assert!(a.same_field(&b));
        assert!(!a.same_field(&c));
        assert!(!c.same_field(&c));
    }
}
