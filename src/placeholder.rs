//! Protected code regions.
//!
//! A region is delimited by a begin marker and an end marker written with the
//! same comment mark:
//!
//! ```text
//! // region CODE_REGION(Imports)
//! use std::fmt;
//! // endregion
//! ```
//!
//! Regions are keyed by their trimmed identifier. Regenerating a file copies
//! the content of every region found in the previous version into the region
//! with the same identifier in the fresh output.

use crate::error::Result;
use regex::bytes::Regex;
use std::sync::LazyLock;

/// The comment prefix that introduces a region marker line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSectionMark(pub &'static str);

impl CodeSectionMark {
    /// Builds the line-oriented region pattern for this mark.
    ///
    /// # Errors
    ///
    /// Returns `ScaffoldError::Regex` if the resulting pattern fails to compile.
    pub fn find_regex(&self) -> Result<Regex> {
        let q = regex::escape(self.0);
        let pattern = format!(
            r"(?ms)^([\t ]*{q}[\t ]*region CODE_REGION\([\t ]*([^\n\)]+?)[\t ]*\)[\t ]*\n)(.*?\n?)([\t ]*{q}[\t ]*endregion[\t ]*)$"
        );
        Ok(Regex::new(&pattern)?)
    }
}

/// Default marks, in priority order.
pub const DEFAULT_CODE_SECTION_MARKS: [CodeSectionMark; 3] = [
    CodeSectionMark("//"),
    CodeSectionMark("#"),
    CodeSectionMark("#pragma "),
];

/// A protected region found in a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The whole matched span: `begin + content + end`
    pub raw: Vec<u8>,
    /// Begin marker line, including its newline
    pub begin: Vec<u8>,
    /// Trimmed identifier used as merge key
    pub identifier: String,
    /// Bytes between the marker lines
    pub content: Vec<u8>,
    /// End marker line, without a trailing newline
    pub end: Vec<u8>,
    pub mark: CodeSectionMark,
}

impl Placeholder {
    /// Returns a copy of the placeholder with its content replaced.
    pub fn with_content(&self, content: &[u8]) -> Placeholder {
        let mut raw = Vec::with_capacity(self.begin.len() + content.len() + self.end.len());
        raw.extend_from_slice(&self.begin);
        raw.extend_from_slice(content);
        raw.extend_from_slice(&self.end);

        Placeholder {
            raw,
            begin: self.begin.clone(),
            identifier: self.identifier.clone(),
            content: content.to_vec(),
            end: self.end.clone(),
            mark: self.mark,
        }
    }
}

/// Finds and merges regions for a fixed list of comment marks.
#[derive(Debug, Clone)]
pub struct RegionMatcher {
    marks: Vec<(CodeSectionMark, Regex)>,
}

impl RegionMatcher {
    /// Creates a matcher recognizing `marks`, in the given priority order.
    ///
    /// # Errors
    ///
    /// Returns `ScaffoldError::Regex` if a mark produces an invalid pattern.
    pub fn new(marks: &[CodeSectionMark]) -> Result<Self> {
        let marks = marks
            .iter()
            .map(|mark| Ok((*mark, mark.find_regex()?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { marks })
    }

    pub fn marks(&self) -> impl Iterator<Item = CodeSectionMark> + '_ {
        self.marks.iter().map(|(mark, _)| *mark)
    }

    /// Returns every region in `data`, grouped by mark priority and in
    /// document order within a mark.
    pub fn find_all(&self, data: &[u8]) -> Vec<Placeholder> {
        let data = normalize_line_endings(data);
        let mut placeholders = Vec::new();

        for (mark, regex) in &self.marks {
            for captures in regex.captures_iter(&data) {
                let group = |i: usize| captures.get(i).map_or(&[][..], |m| m.as_bytes());
                placeholders.push(Placeholder {
                    raw: group(0).to_vec(),
                    begin: group(1).to_vec(),
                    identifier: String::from_utf8_lossy(group(2)).trim().to_string(),
                    content: group(3).to_vec(),
                    end: group(4).to_vec(),
                    mark: *mark,
                });
            }
        }

        placeholders
    }

    /// Copies the content of each of `placeholders` into the first region of
    /// `data` sharing its identifier. Unmatched placeholders are ignored.
    pub fn replace_all(&self, data: &[u8], placeholders: &[Placeholder]) -> Vec<u8> {
        let mut data = normalize_line_endings(data);
        let targets = self.find_all(&data);

        for placeholder in placeholders {
            let Some(target) = targets
                .iter()
                .find(|target| target.identifier == placeholder.identifier)
            else {
                continue;
            };

            let replacement = target.with_content(&placeholder.content);
            data = replace_first(&data, &target.raw, &replacement.raw);
        }

        data
    }

    /// Projects the regions of `src` onto `dest`.
    pub fn find_and_replace_all(&self, src: &[u8], dest: &[u8]) -> Vec<u8> {
        self.replace_all(dest, &self.find_all(src))
    }
}

static DEFAULT_MATCHER: LazyLock<RegionMatcher> = LazyLock::new(|| {
    RegionMatcher::new(&DEFAULT_CODE_SECTION_MARKS)
        .expect("default code section marks compile to valid patterns")
});

/// The matcher for [`DEFAULT_CODE_SECTION_MARKS`].
pub fn default_matcher() -> &'static RegionMatcher {
    &DEFAULT_MATCHER
}

/// Finds all regions in `data` using the default marks.
pub fn find_all(data: &[u8]) -> Vec<Placeholder> {
    DEFAULT_MATCHER.find_all(data)
}

/// Replaces region contents in `data` using the default marks.
pub fn replace_all(data: &[u8], placeholders: &[Placeholder]) -> Vec<u8> {
    DEFAULT_MATCHER.replace_all(data, placeholders)
}

/// Finds all regions in `src` and copies their content into `dest`.
pub fn find_and_replace_all(src: &[u8], dest: &[u8]) -> Vec<u8> {
    DEFAULT_MATCHER.find_and_replace_all(src, dest)
}

/// Converts CRLF line endings to LF.
pub fn normalize_line_endings(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut bytes = data.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    out
}

fn replace_first(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let position = if needle.is_empty() {
        None
    } else {
        haystack.windows(needle.len()).position(|window| window == needle)
    };

    match position {
        Some(start) => {
            let mut out =
                Vec::with_capacity(haystack.len() - needle.len() + replacement.len());
            out.extend_from_slice(&haystack[..start]);
            out.extend_from_slice(replacement);
            out.extend_from_slice(&haystack[start + needle.len()..]);
            out
        }
        None => haystack.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BEFORE: &str = "\
package foo

// region CODE_REGION(Imports)
import \"fmt\"
import \"os\"
// endregion

func old() {}

// region CODE_REGION(Body)

	fmt.Println(\"hand written\")

// endregion

# region CODE_REGION(Config)
key: kept
# endregion
";

    const TEMPLATE: &str = "\
// Code generated. Edit regions only.
package foo

// region CODE_REGION(Imports)
// endregion

func generated() {}

	// region CODE_REGION(Body)
	// endregion

# region CODE_REGION(Config)
key: default
# endregion

// region CODE_REGION(Extra)
extra default
// endregion
";

    const AFTER: &str = "\
// Code generated. Edit regions only.
package foo

// region CODE_REGION(Imports)
import \"fmt\"
import \"os\"
// endregion

func generated() {}

	// region CODE_REGION(Body)

	fmt.Println(\"hand written\")

	// endregion

# region CODE_REGION(Config)
key: kept
# endregion

// region CODE_REGION(Extra)
extra default
// endregion
";

    fn text(data: Vec<u8>) -> String {
        String::from_utf8(data).unwrap()
    }

    #[test]
    fn test_find_and_replace_all() {
        let actual = find_and_replace_all(BEFORE.as_bytes(), TEMPLATE.as_bytes());
        assert_eq!(text(actual), AFTER);
    }

    #[test]
    fn test_find_and_replace_all_crlf() {
        let crlf = BEFORE.replace('\n', "\r\n");
        let actual = find_and_replace_all(crlf.as_bytes(), TEMPLATE.as_bytes());
        assert_eq!(text(actual), AFTER);

        let lf = find_and_replace_all(BEFORE.as_bytes(), TEMPLATE.as_bytes());
        let crlf_dest = TEMPLATE.replace('\n', "\r\n");
        let both = find_and_replace_all(crlf.as_bytes(), crlf_dest.as_bytes());
        assert_eq!(text(both), text(lf));
    }

    #[test]
    fn test_identifier_parsing() {
        let cases = [
            ("Foo", "Foo"),
            ("Foo_Bar", "Foo_Bar"),
            ("0", "0"),
            ("____", "____"),
            ("00_aa_bb_cc", "00_aa_bb_cc"),
            ("\t    Foo Bar\t\t\t\t   \t\t\t", "Foo Bar"),
            ("Foo Bar", "Foo Bar"),
            ("Foo-Bar", "Foo-Bar"),
            ("Foo/Bar", "Foo/Bar"),
            ("  \tFoo.Bar   \t", "Foo.Bar"),
        ];

        for (input, expected) in cases {
            let data = format!("// region CODE_REGION({input})\nSome data here\n// endregion");
            let placeholders = find_all(data.as_bytes());
            assert_eq!(placeholders.len(), 1, "input {input:?}");
            assert_eq!(placeholders[0].identifier, expected);
        }
    }

    #[test]
    fn test_placeholder_parts_reassemble() {
        let data = "  // region CODE_REGION( Foo )  \n\nline\n\n  //  endregion \n";
        let placeholders = find_all(data.as_bytes());
        assert_eq!(placeholders.len(), 1);

        let p = &placeholders[0];
        assert_eq!(text(p.begin.clone()), "  // region CODE_REGION( Foo )  \n");
        assert_eq!(text(p.content.clone()), "\nline\n\n");
        assert_eq!(text(p.end.clone()), "  //  endregion ");
        assert_eq!(p.mark, CodeSectionMark("//"));

        let mut joined = p.begin.clone();
        joined.extend_from_slice(&p.content);
        joined.extend_from_slice(&p.end);
        assert_eq!(joined, p.raw);
    }

    #[test]
    fn test_with_content_keeps_markers() {
        let data = "# region CODE_REGION(A)\nold\n# endregion";
        let p = find_all(data.as_bytes()).remove(0);
        let q = p.with_content(b"new\n");
        assert_eq!(q.begin, p.begin);
        assert_eq!(q.end, p.end);
        assert_eq!(text(q.raw), "# region CODE_REGION(A)\nnew\n# endregion");
    }

    #[test]
    fn test_empty_region() {
        let data = "// region CODE_REGION(Empty)\n// endregion\n";
        let placeholders = find_all(data.as_bytes());
        assert_eq!(placeholders.len(), 1);
        assert!(placeholders[0].content.is_empty());
    }

    #[test]
    fn test_mark_priority_order() {
        let data = "\
# region CODE_REGION(Hash)
h
# endregion
#pragma region CODE_REGION(Pragma)
p
#pragma endregion
// region CODE_REGION(Slash)
s
// endregion
";
        let ids: Vec<_> = find_all(data.as_bytes())
            .into_iter()
            .map(|p| p.identifier)
            .collect();
        assert_eq!(ids, vec!["Slash", "Hash", "Pragma"]);
    }

    #[test]
    fn test_region_preservation() {
        let existing = "old header\n// region CODE_REGION(Foo)\nOLD\n// endregion\nold footer\n";
        let fresh = "new header\n\n// region CODE_REGION(Foo)\nNEW\n// endregion\nnew footer\n";
        let merged = find_and_replace_all(existing.as_bytes(), fresh.as_bytes());
        assert_eq!(
            text(merged),
            "new header\n\n// region CODE_REGION(Foo)\nOLD\n// endregion\nnew footer\n"
        );
    }

    #[test]
    fn test_unmatched_identifier_is_noop() {
        let src = "// region CODE_REGION(Missing)\nvalue\n// endregion\n";
        let dest = "top\n// region CODE_REGION(Other)\nkeep\n// endregion\n";
        let merged = find_and_replace_all(src.as_bytes(), dest.as_bytes());
        assert_eq!(text(merged), dest);
    }

    #[test]
    fn test_duplicate_identifiers_first_wins() {
        let src = "\
// region CODE_REGION(Foo)
X
// endregion
// region CODE_REGION(Foo)
Y
// endregion
";
        let dest = "\
// region CODE_REGION(Foo)
A
// endregion
middle
// region CODE_REGION(Foo)
B
// endregion
";
        let merged = find_and_replace_all(src.as_bytes(), dest.as_bytes());
        assert_eq!(
            text(merged),
            "\
// region CODE_REGION(Foo)
X
// endregion
middle
// region CODE_REGION(Foo)
B
// endregion
"
        );
    }

    #[test]
    fn test_unterminated_region_is_ignored() {
        let data = "// region CODE_REGION(Open)\nno end marker\n";
        assert!(find_all(data.as_bytes()).is_empty());
    }

    #[test]
    fn test_custom_marks() {
        let matcher = RegionMatcher::new(&[CodeSectionMark("--")]).unwrap();
        let src = "-- region CODE_REGION(Q)\nSELECT 1;\n-- endregion\n";
        let dest = "-- region CODE_REGION(Q)\n-- endregion\n";
        let merged = matcher.find_and_replace_all(src.as_bytes(), dest.as_bytes());
        assert_eq!(text(merged), src);
        assert_eq!(matcher.marks().collect::<Vec<_>>(), vec![CodeSectionMark("--")]);

        // `//` regions are invisible to a matcher that only knows `--`
        assert!(matcher.find_all(b"// region CODE_REGION(Q)\n// endregion").is_empty());
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings(b"a\r\nb\r\n"), b"a\nb\n");
        assert_eq!(normalize_line_endings(b"a\rb"), b"a\rb");
        assert_eq!(normalize_line_endings(b""), b"");
    }

    #[test]
    fn test_replace_first() {
        assert_eq!(replace_first(b"abcabc", b"bc", b"X"), b"aXabc");
        assert_eq!(replace_first(b"abc", b"zz", b"X"), b"abc");
    }
}
