//! Path expressions addressing a string inside a JSON document.
//!
//! The wire form is dotted/bracketed (`object[3].description`,
//! `command[12].choice[1]`). It is parsed once into [`Segment`]s; numeric
//! segments index containers, everything else names a field.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathExpr {
    segments: Vec<Segment>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,
    #[error("malformed path expression '{0}'")]
    Malformed(String),
    #[error("path '{path}' does not resolve: {reason}")]
    Unresolved { path: String, reason: String },
}

impl PathExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn unresolved(&self, reason: impl Into<String>) -> PathError {
        PathError::Unresolved {
            path: self.to_string(),
            reason: reason.into(),
        }
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let malformed = || PathError::Malformed(s.to_string());
        let mut segments = Vec::new();
        let mut rest = s;

        // Grammar: key ( '.' key | '[' digits ']' )*
        let (first, tail) = dotted_part(rest).ok_or_else(malformed)?;
        segments.push(first);
        rest = tail;

        while let Some(marker) = rest.chars().next() {
            rest = &rest[marker.len_utf8()..];
            match marker {
                '[' => {
                    let close = rest.find(']').ok_or_else(malformed)?;
                    let digits = &rest[..close];
                    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(malformed());
                    }
                    let index = digits.parse().map_err(|_| malformed())?;
                    segments.push(Segment::Index(index));
                    rest = &rest[close + 1..];
                }
                '.' => {
                    let (segment, tail) = dotted_part(rest).ok_or_else(malformed)?;
                    segments.push(segment);
                    rest = tail;
                }
                _ => return Err(malformed()),
            }
        }

        Ok(Self { segments })
    }
}

/// Split the leading `.`-delimited part off `input`. All-digit parts are
/// indices.
fn dotted_part(input: &str) -> Option<(Segment, &str)> {
    let len = input.find(['.', '[', ']']).unwrap_or(input.len());
    let part = &input[..len];
    if part.is_empty() {
        return None;
    }
    let segment = if part.bytes().all(|b| b.is_ascii_digit()) {
        Segment::Index(part.parse().ok()?)
    } else {
        Segment::Key(part.to_string())
    };
    Some((segment, &input[len..]))
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Follow `segments` literally: indices into arrays, keys into objects.
pub fn walk_mut<'a>(
    root: &'a mut Value,
    segments: &[Segment],
    path: &PathExpr,
) -> Result<&'a mut Value, PathError> {
    let mut current = root;
    for segment in segments {
        current = match segment {
            Segment::Index(i) => current
                .as_array_mut()
                .and_then(|items| items.get_mut(*i))
                .ok_or_else(|| path.unresolved(format!("no element at index {}", i)))?,
            Segment::Key(key) => current
                .as_object_mut()
                .and_then(|fields| fields.get_mut(key.as_str()))
                .ok_or_else(|| path.unresolved(format!("no field '{}'", key)))?,
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_object_path() {
        let path: PathExpr = "object[3].description".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("object".into()),
                Segment::Index(3),
                Segment::Key("description".into())
            ]
        );
    }

    #[test]
    fn test_parse_nested_indices() {
        let path: PathExpr = "command[12].choice[1]".parse().unwrap();
        assert_eq!(
            path,
            PathExpr::new().key("command").index(12).key("choice").index(1)
        );
    }

    #[test]
    fn test_display_renders_wire_form() {
        let path = PathExpr::new().key("object").index(0).key("message2");
        assert_eq!(path.to_string(), "object[0].message2");

        let path = PathExpr::new().key("events").index(1).key("pages").index(0);
        assert_eq!(path.to_string(), "events[1].pages[0]");
    }

    #[test]
    fn test_parse_display_is_stable() {
        for raw in [
            "object[3].description",
            "command[0].text",
            "command[7].choice[2]",
            "common_event[4].text",
            "events[1].pages[0].list[3].parameters[0]",
        ] {
            let path: PathExpr = raw.parse().unwrap();
            assert_eq!(path.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<PathExpr>(), Err(PathError::Empty));
        assert!(matches!(
            "object[].name".parse::<PathExpr>(),
            Err(PathError::Malformed(_))
        ));
        assert!(matches!(
            "object..name".parse::<PathExpr>(),
            Err(PathError::Malformed(_))
        ));
        assert!(matches!(
            "object[99999999999999999999999]".parse::<PathExpr>(),
            Err(PathError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unpaired_brackets() {
        for raw in [
            "object]name",
            "object[1",
            "object[]",
            "a[b]",
            "object[1]]",
            "object[1]name",
            "[0].name",
            "object[1.2]",
            "object.",
            "object[2]é",
        ] {
            assert_eq!(
                raw.parse::<PathExpr>(),
                Err(PathError::Malformed(raw.to_string())),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_dotted_digits_are_indices() {
        let path: PathExpr = "object.3.name".parse().unwrap();
        assert_eq!(path, PathExpr::new().key("object").index(3).key("name"));
    }

    #[test]
    fn test_walk_mut_literal() {
        let mut doc = json!({"events": [null, {"pages": [{"list": [{"parameters": ["Ciao"]}]}]}]});
        let path: PathExpr = "events[1].pages[0].list[0].parameters[0]".parse().unwrap();

        let leaf = walk_mut(&mut doc, path.segments(), &path).unwrap();
        assert_eq!(leaf, &json!("Ciao"));
        *leaf = json!("Hello");

        assert_eq!(doc["events"][1]["pages"][0]["list"][0]["parameters"][0], "Hello");
    }

    #[test]
    fn test_walk_mut_reports_missing_step() {
        let mut doc = json!({"events": []});
        let path: PathExpr = "events[2].pages".parse().unwrap();

        let err = walk_mut(&mut doc, path.segments(), &path).unwrap_err();
        assert!(err.to_string().contains("no element at index 2"));
    }
}
