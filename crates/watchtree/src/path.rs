//! Path expressions addressing locations in the tree.
//!
//! Two textual notations (`a.b.0` and `a.b[0]`) and a pre-split segment
//! form all normalize to the same key sequence. Parsing never fails:
//! segments are the maximal runs of characters excluding `.`, `[` and `]`,
//! so malformed input simply yields fewer tokens.

/// An ordered key sequence. The empty path addresses the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(Vec<String>);

impl Path {
    pub fn root() -> Path {
        Path(Vec::new())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dotted context string, as carried by handles and event namespaces.
    pub fn to_context(&self) -> String {
        self.0.join(".")
    }
}

/// Tokenize a textual path into segments.
pub fn split_segments(input: &str) -> Vec<String> {
    input
        .split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<&str> for Path {
    fn from(input: &str) -> Path {
        Path(split_segments(input))
    }
}

impl From<String> for Path {
    fn from(input: String) -> Path {
        Path::from(input.as_str())
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Path {
        Path(segments.into_iter().filter(|s| !s.is_empty()).collect())
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Path {
        Path(
            segments
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Path {
        Path::from(&segments[..])
    }
}

impl From<&Path> for Path {
    fn from(path: &Path) -> Path {
        path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(input: &str) -> Vec<String> {
        split_segments(input)
    }

    #[test]
    fn dot_notation() {
        assert_eq!(segs("a.b.0"), vec!["a", "b", "0"]);
    }

    #[test]
    fn bracket_notation() {
        assert_eq!(segs("a.b[0]"), vec!["a", "b", "0"]);
    }

    #[test]
    fn mixed_notation() {
        assert_eq!(segs("stuff.nest[0].foo"), vec!["stuff", "nest", "0", "foo"]);
    }

    #[test]
    fn empty_input_is_root() {
        assert!(segs("").is_empty());
        assert!(Path::from("").is_empty());
    }

    #[test]
    fn malformed_input_degrades() {
        assert_eq!(segs("a..b"), vec!["a", "b"]);
        assert_eq!(segs(".a["), vec!["a"]);
        assert_eq!(segs("]]["), Vec::<String>::new());
        assert_eq!(segs(".key"), vec!["key"]);
    }

    #[test]
    fn forms_are_equivalent() {
        assert_eq!(Path::from("a.b[0]"), Path::from(["a", "b", "0"]));
        assert_eq!(
            Path::from("a.b.0"),
            Path::from(vec!["a".to_string(), "b".to_string(), "0".to_string()])
        );
    }

    #[test]
    fn context_round_trip() {
        assert_eq!(Path::from("stuff.info.1").to_context(), "stuff.info.1");
        assert_eq!(Path::root().to_context(), "");
    }
}
