//! Renders a file set back into the heading + fenced-block grammar.
//!
//! Used to quote existing files inside edit prompts, and to round-trip
//! parsed projects in tests.

use stackforge_core::FileSet;

/// Fence language hint derived from a path's extension.
pub fn language_hint(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("");
    match ext {
        "ts" => "typescript",
        "tsx" => "tsx",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "rs" => "rust",
        "py" => "python",
        "json" => "json",
        "css" => "css",
        "html" => "html",
        "md" => "markdown",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "sql" => "sql",
        "sh" => "bash",
        _ => "",
    }
}

/// Render one file as a `#### path` heading plus fenced block.
pub fn render_file(path: &str, content: &str) -> String {
    format!(
        "#### {path}\n```{lang}\n{content}\n```\n",
        lang = language_hint(path),
        content = content.trim_end()
    )
}

/// Render an entire file set in path order.
pub fn render_project(files: &FileSet) -> String {
    files
        .iter()
        .map(|(path, content)| render_file(path, content))
        .collect::<Vec<_>>()
        .join("\n")
}
