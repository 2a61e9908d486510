use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mapping from normalized relative path to generated file content.
///
/// Paths use forward slashes with no leading slash; inserting the same path
/// twice keeps the later content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

/// Normalize a generated file path: backslashes become forward slashes,
/// surrounding whitespace and any leading slash are stripped.
pub fn normalize_path(path: &str) -> String {
    let normalized = path.trim().replace('\\', "/");
    normalized.trim_start_matches('/').to_string()
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, content: impl Into<String>) {
        self.files.insert(normalize_path(path), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize_path(path)).map(String::as_str)
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(&normalize_path(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Overlay `other` onto this set. Shared paths take the incoming
    /// content; paths absent from `other` are never removed.
    pub fn merge(&mut self, other: FileSet) {
        for (path, content) in other.files {
            self.files.insert(path, content);
        }
    }
}

impl FromIterator<(String, String)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, content) in iter {
            set.insert(&path, content);
        }
        set
    }
}

/// The generated artifact attached to a session after a successful
/// generation: the full model document plus the parsed view of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectBundle {
    pub document: String,
    pub files: FileSet,
    pub readme: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ProjectBundle {
    pub fn new(document: impl Into<String>, files: FileSet, readme: Option<String>) -> Self {
        Self {
            document: document.into(),
            files,
            readme,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths_on_insert() {
        let mut files = FileSet::new();
        files.insert("/frontend\\src\\App.tsx", "export {}");
        assert!(files.contains("frontend/src/App.tsx"));
        assert_eq!(files.get(" frontend/src/App.tsx "), Some("export {}"));
    }

    #[test]
    fn duplicate_path_keeps_last_content() {
        let mut files = FileSet::new();
        files.insert("src/main.ts", "first");
        files.insert("/src/main.ts", "second");
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("src/main.ts"), Some("second"));
    }

    #[test]
    fn merge_overwrites_but_never_deletes() {
        let mut base = FileSet::new();
        base.insert("a.ts", "old a");
        base.insert("b.ts", "old b");

        let mut patch = FileSet::new();
        patch.insert("a.ts", "new a");
        patch.insert("c.ts", "new c");

        base.merge(patch);
        assert_eq!(base.get("a.ts"), Some("new a"));
        assert_eq!(base.get("b.ts"), Some("old b"));
        assert_eq!(base.get("c.ts"), Some("new c"));
    }
}
