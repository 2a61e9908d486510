//! Parser for the generated-project markdown grammar.
//!
//! The prompt templates instruct the backend to emit every file as a heading
//! line naming its path (`#### frontend/src/App.tsx`), immediately followed
//! by one fenced code block holding the complete file.
//!
//! Backend output drifts between template versions (bold or backtick-wrapped
//! paths, a repeated `// path:` comment as the block's first line, a README
//! presented without a fence), so the scan is tolerant. A document with no
//! recognizable blocks is not an error: the raw text is preserved for
//! diagnostics and the file set is simply empty.

use once_cell::sync::Lazy;
use regex::Regex;

use stackforge_core::{normalize_path, FileSet};

/// Reserved path for the project's top-level readme.
pub const README_PATH: &str = "README.md";

/// A heading line naming a file path, immediately followed by a fenced code
/// block. Blank lines between heading and fence are tolerated; the closing
/// fence must sit on its own line.
static FILE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^#{1,6}[ \t]+(?P<head>[^\r\n]+?)[ \t]*\r?\n(?:[ \t]*\r?\n)*^```(?P<lang>[A-Za-z0-9_+.\-]*)[ \t]*\r?\n(?P<body>(?s:.*?))^```[ \t]*$",
    )
    .unwrap()
});

/// A repeated path comment some template versions emit as the first line of
/// a code block (`// path: /src/App.tsx`, `# path: …`, `<!-- path: … -->`).
static PATH_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?://|#|<!--|/\*)[ \t]*(?:file)?path:[ \t]*(?P<path>\S+)[ \t]*(?:-->|\*/)?[ \t]*$").unwrap()
});

/// Heading that introduces the readme as a plain section rather than a
/// path + fence pair.
static README_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^#{1,6}[ \t]+[^\r\n]*\bREADME(?:\.md)?\b[^\r\n]*$").unwrap());

/// Horizontal rule separating stitched sections of the combined document.
static SECTION_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^---[ \t]*$").unwrap());

/// Result of parsing one generated document.
///
/// `raw` always holds the input text, so an empty file set remains
/// diagnosable and is distinguishable from "nothing was generated".
#[derive(Debug, Clone, Default)]
pub struct ParsedProject {
    pub files: FileSet,
    pub readme: Option<String>,
    pub raw: String,
}

/// Extract the file mapping (and readme) from a generated document.
pub fn parse_project(document: &str) -> ParsedProject {
    let mut files = FileSet::new();

    for caps in FILE_BLOCK.captures_iter(document) {
        let Some(path) = heading_path(&caps["head"]) else {
            continue;
        };
        let body = strip_path_comment(&caps["body"]);
        files.insert(&path, body.trim().to_string());
    }

    let readme = files
        .get(README_PATH)
        .map(str::to_string)
        .or_else(|| loose_readme(document));

    ParsedProject {
        files,
        readme,
        raw: document.to_string(),
    }
}

/// Clean a heading and decide whether it names a file path.
///
/// Strips bold/backtick wrapping and a trailing colon, then requires a
/// single token containing a dot or slash; prose headings ("Setup
/// Instructions") never qualify even when a fence follows them.
fn heading_path(heading: &str) -> Option<String> {
    let cleaned = heading
        .trim()
        .trim_matches(|c| c == '*' || c == '`' || c == '_')
        .trim_end_matches(':')
        .trim();

    if cleaned.is_empty()
        || cleaned.len() > 256
        || cleaned.chars().any(char::is_whitespace)
        || !(cleaned.contains('/') || cleaned.contains('.'))
    {
        return None;
    }

    let normalized = normalize_path(cleaned);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Drop a first-line path comment when the block repeats its own path.
fn strip_path_comment(body: &str) -> &str {
    let mut lines = body.splitn(2, '\n');
    let first = lines.next().unwrap_or("");
    if PATH_COMMENT.is_match(first.trim_end_matches('\r')) {
        lines.next().unwrap_or("")
    } else {
        body
    }
}

/// Fallback readme capture: a literal README heading followed by an
/// unfenced section. The body may contain markdown headings of its own, so
/// the capture runs until the next file block or section rule, not the next
/// heading line.
fn loose_readme(document: &str) -> Option<String> {
    let heading = README_HEADING.find(document)?;
    let rest = &document[heading.end()..];
    let mut end = rest.len();
    if let Some(m) = FILE_BLOCK.find(rest) {
        end = end.min(m.start());
    }
    if let Some(m) = SECTION_RULE.find(rest) {
        end = end.min(m.start());
    }
    let mut section = rest[..end].trim().to_string();

    // Some replies still fence the section body without a path heading.
    if section.starts_with("```") {
        section = section
            .lines()
            .skip(1)
            .take_while(|line| !line.trim_start().starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
    }

    if section.is_empty() {
        None
    } else {
        Some(section)
    }
}
