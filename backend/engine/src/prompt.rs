//! Prompt templates.
//!
//! Pure string composition: the same user text and plan always produce
//! byte-identical prompts. Template text and the parser grammar are
//! versioned together: the output format described here is exactly what
//! `stackforge-markdown` scans for.

use stackforge_core::{FileSet, Section, SectionPlan};
use stackforge_markdown::render_file;

use crate::continuation::CONTINUATION_MARKER;
use crate::edit::CHANGE_SUMMARY_PATH;

/// System persona opening every generation-capable history.
pub const SYSTEM_PERSONA: &str =
    "You are an expert software developer with a focus on clean, production-ready code.";

/// System persona for pre-generation requirement-refinement chat.
pub const CONVERSE_PERSONA: &str = "You are a requirements analyst for a software project \
generator. Help the user sharpen their application description: ask about missing details \
(users, data, screens, integrations) one question at a time, and keep answers short. When \
the description is complete enough to build from, say so and summarize it.";

/// The meta-prompt embedding fixed engineering constraints around the
/// user's description.
pub fn base_prompt(user_input: &str) -> String {
    format!(
        r#"You are an expert full-stack developer. Generate production-grade, modular, well-documented code for the web application described below.

User request: "{user_input}"

Tech stack:
- Frontend: React (TypeScript) + Tailwind CSS + Vite + React Router + Zustand
- Backend: Express.js (TypeScript) + Node.js + Supabase (PostgreSQL)
- Authentication: Supabase Auth + JWT

Project requirements:
- Clean, modular, DRY code with proper TypeScript types
- A complete, runnable folder/file structure with no broken imports
- Complete configuration files for both halves:
  frontend: package.json, vite.config.ts, index.html, tailwind.config.js, tsconfig.json, .env.example
  backend: package.json, tsconfig.json, .env.example
- Environment variables via import.meta.env.VITE_* on the frontend and process.env.* on the backend, with .env.example files listing every variable
- A comprehensive README.md with step-by-step setup instructions
- Proper error handling, loading states, and responsive styling

Output format (strict):
Emit every file as a markdown heading naming its path, immediately followed by one fenced code block holding the complete file:

#### frontend/src/App.tsx
```tsx
// code here
```

If your output would exceed the length limit, end it with {CONTINUATION_MARKER} and resume exactly where you stopped in the next response without repeating completed content.

Generate the application for: "{user_input}""#
    )
}

/// The default staged plan: six ordered sections, each conditioned on
/// everything generated before it.
pub fn full_stack_plan() -> SectionPlan {
    SectionPlan::new()
        .with_section(
            "overview",
            "Start with Part 1 - Project Overview. Describe the purpose, features, and architecture of the app based on the user's request.",
        )
        .with_section(
            "structure",
            "Generate Part 2 - Folder Structure as a markdown tree showing both the frontend/ and backend/ directories.",
        )
        .with_section(
            "frontend",
            "Generate Part 3 - Frontend Code: every React TypeScript component, hook, Zustand store, Tailwind CSS file, and Vite configuration file.",
        )
        .with_section(
            "backend",
            "Generate Part 4 - Backend Code: the Express.js TypeScript server, API routes, middleware, Supabase integration, and authentication.",
        )
        .with_section(
            "setup",
            "Generate Part 5 - Setup Instructions for installing dependencies, configuring environment variables, setting up Supabase, and running both halves.",
        )
        .with_section(
            "notes",
            "Generate Part 6 - Notes about environment variables, assumptions, limitations, and optional improvements.",
        )
}

/// Task prompt for one section. The first section carries the full base
/// prompt; later sections rely on the history already holding it.
pub fn section_prompt(base: &str, section: &Section, first: bool) -> String {
    if first {
        format!("{base}\n\n{}", section.instruction)
    } else {
        section.instruction.clone()
    }
}

/// Edit step A: ask which of the known files a change request touches.
/// The reply must be nothing but newline-separated paths.
pub fn selection_prompt(readme: &str, change_request: &str, paths: &[String]) -> String {
    format!(
        r#"An existing generated project is described by this README:

{readme}

The project contains exactly these files:
{paths}

The user wants the following change:
"{change_request}"

Reply with ONLY the paths of the files that must be modified to implement this change, one path per line, chosen from the list above. No commentary, no new paths."#,
        paths = paths.join("\n")
    )
}

/// Edit step B: ask for replacement content for just the affected files.
pub fn patch_prompt(readme: &str, affected: &FileSet, change_request: &str) -> String {
    let rendered = affected
        .iter()
        .map(|(path, content)| render_file(path, content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"An existing generated project is described by this README:

{readme}

Here are the current contents of the files to change:

{rendered}

Apply the following change:
"{change_request}"

Rules:
- Return ONLY the files you changed, each as a markdown heading naming its path followed by one fenced code block with the complete new file content.
- Preserve existing formatting, imports, and code style; change only what the request demands.
- Finish with one extra block using the path {CHANGE_SUMMARY_PATH} containing a short human-readable summary of what changed."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_prompt_is_deterministic() {
        let a = base_prompt("a todo app with tags");
        let b = base_prompt("a todo app with tags");
        assert_eq!(a, b);
        assert!(a.contains("\"a todo app with tags\""));
        assert!(a.contains(CONTINUATION_MARKER));
    }

    #[test]
    fn section_prompts_are_deterministic_over_the_plan() {
        let plan = full_stack_plan();
        let base = base_prompt("an inventory tracker");
        let first: Vec<_> = plan
            .sections()
            .iter()
            .enumerate()
            .map(|(i, s)| section_prompt(&base, s, i == 0))
            .collect();
        let second: Vec<_> = plan
            .sections()
            .iter()
            .enumerate()
            .map(|(i, s)| section_prompt(&base, s, i == 0))
            .collect();
        assert_eq!(first, second);
        assert!(first[0].contains("an inventory tracker"));
        assert!(first[0].ends_with(&plan.sections()[0].instruction));
        assert_eq!(first[1], plan.sections()[1].instruction);
    }

    #[test]
    fn default_plan_is_six_sections_in_order() {
        let plan = full_stack_plan();
        let names: Vec<_> = plan.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["overview", "structure", "frontend", "backend", "setup", "notes"]
        );
    }

    #[test]
    fn selection_prompt_lists_every_known_path() {
        let paths = vec!["a.ts".to_string(), "b.ts".to_string()];
        let prompt = selection_prompt("readme text", "rename the button", &paths);
        assert!(prompt.contains("a.ts\nb.ts"));
        assert!(prompt.contains("one path per line"));
    }

    #[test]
    fn patch_prompt_quotes_files_and_demands_summary() {
        let mut affected = FileSet::new();
        affected.insert("src/app.ts", "let x = 1;");
        let prompt = patch_prompt("readme", &affected, "make x 2");
        assert!(prompt.contains("#### src/app.ts"));
        assert!(prompt.contains("```typescript\nlet x = 1;\n```"));
        assert!(prompt.contains(CHANGE_SUMMARY_PATH));
    }
}
