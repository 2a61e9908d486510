//! Targeted edit engine.
//!
//! Two-step protocol against an existing bundle: ask the backend which
//! known files a change touches (step A), then ask for replacement content
//! for exactly those files (step B). Paths the backend invents are
//! discarded; an edit that maps to no known file is a semantic failure and
//! is never retried.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use stackforge_core::{
    normalize_path, ChatMessage, CompletionOptions, FileSet, ForgeError, ProjectBundle, Session,
};
use stackforge_markdown::parse_project;

use crate::continuation::CompletionPipeline;
use crate::prompt;

/// Reserved pseudo-file the patch prompt demands as a trailing block; split
/// out of the merged file set and returned as the human-readable summary.
pub const CHANGE_SUMMARY_PATH: &str = "CHANGE_SUMMARY.md";

/// Result of a targeted edit.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub files: FileSet,
    pub affected: Vec<String>,
    pub summary: Option<String>,
}

pub struct EditEngine {
    pipeline: Arc<CompletionPipeline>,
    bundles: Arc<dyn stackforge_core::BundleStore>,
    options: CompletionOptions,
}

impl EditEngine {
    pub fn new(
        pipeline: Arc<CompletionPipeline>,
        bundles: Arc<dyn stackforge_core::BundleStore>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            pipeline,
            bundles,
            options,
        }
    }

    /// Apply a natural-language change request to the session's generated
    /// project, patching only the affected files.
    #[instrument(skip(self, session, change_request), fields(session_id = %session.id))]
    pub async fn apply(
        &self,
        session: &mut Session,
        change_request: &str,
    ) -> Result<EditOutcome, ForgeError> {
        // A missing bundle means the known file set is empty, so no edit
        // can map to a known file.
        let mut bundle = match self.resolve_bundle(session).await? {
            Some(bundle) if !bundle.files.is_empty() => bundle,
            _ => return Err(ForgeError::NoAffectedFiles),
        };

        let readme = bundle.readme.clone().unwrap_or_default();
        let affected = self
            .select_affected(&bundle, &readme, change_request)
            .await?;
        info!(affected = affected.len(), "affected files selected");

        let patch = self
            .generate_patch(&bundle, &readme, &affected, change_request)
            .await?;

        let mut parsed = parse_project(&patch);
        let summary = parsed.files.remove(CHANGE_SUMMARY_PATH);
        if parsed.files.is_empty() {
            warn!("patch response contained no file blocks; nothing merged");
        }

        bundle.files.merge(parsed.files);
        session.bundle = Some(bundle.clone());
        self.bundles.save(&session.id, &bundle).await?;

        Ok(EditOutcome {
            files: bundle.files,
            affected,
            summary,
        })
    }

    /// Prefer the live session bundle; fall back to the durable store so an
    /// edit can follow a generate across a restart.
    async fn resolve_bundle(&self, session: &Session) -> Result<Option<ProjectBundle>, ForgeError> {
        if let Some(bundle) = &session.bundle {
            return Ok(Some(bundle.clone()));
        }
        self.bundles.load(&session.id).await
    }

    /// Step A: the backend names affected paths, one per line; anything
    /// outside the known set is dropped.
    async fn select_affected(
        &self,
        bundle: &ProjectBundle,
        readme: &str,
        change_request: &str,
    ) -> Result<Vec<String>, ForgeError> {
        let known: Vec<String> = bundle.files.paths().map(str::to_string).collect();
        let selection = prompt::selection_prompt(readme, change_request, &known);
        let messages = [
            ChatMessage::system(prompt::SYSTEM_PERSONA),
            ChatMessage::user(selection),
        ];
        let reply = self.pipeline.complete_once(&messages, &self.options).await?;

        let mut affected = Vec::new();
        for line in reply.lines() {
            let cleaned = line
                .trim()
                .trim_start_matches(['-', '*'])
                .trim()
                .trim_matches('`');
            if cleaned.is_empty() {
                continue;
            }
            let path = normalize_path(cleaned);
            if bundle.files.contains(&path) && !affected.contains(&path) {
                affected.push(path);
            } else if !path.is_empty() {
                warn!(path = %path, "backend named an unknown file; ignoring");
            }
        }

        if affected.is_empty() {
            return Err(ForgeError::NoAffectedFiles);
        }
        Ok(affected)
    }

    /// Step B: replacement content for just the affected files, in the
    /// same grammar the project parser understands.
    async fn generate_patch(
        &self,
        bundle: &ProjectBundle,
        readme: &str,
        affected: &[String],
        change_request: &str,
    ) -> Result<String, ForgeError> {
        let subset: FileSet = affected
            .iter()
            .filter_map(|path| {
                bundle
                    .files
                    .get(path)
                    .map(|content| (path.clone(), content.to_string()))
            })
            .collect();

        let patch_request = prompt::patch_prompt(readme, &subset, change_request);
        let messages = [
            ChatMessage::system(prompt::SYSTEM_PERSONA),
            ChatMessage::user(patch_request),
        ];
        Ok(self
            .pipeline
            .complete_reassembled(&messages, &self.options)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::TokenThrottle;
    use stackforge_provider::MockBackend;
    use stackforge_session::MemoryBundleStore;

    fn engine_with(mock: Arc<MockBackend>) -> EditEngine {
        let pipeline = Arc::new(CompletionPipeline::new(
            mock,
            Arc::new(TokenThrottle::default()),
        ));
        EditEngine::new(
            pipeline,
            Arc::new(MemoryBundleStore::new()),
            CompletionOptions::default(),
        )
    }

    fn session_with_bundle() -> Session {
        let mut files = FileSet::new();
        files.insert("a.ts", "original a");
        files.insert("b.ts", "original b");
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);
        session.bundle = Some(ProjectBundle::new(
            "doc",
            files,
            Some("# Project readme".into()),
        ));
        session
    }

    #[tokio::test]
    async fn edits_only_the_selected_file() {
        let mock = Arc::new(MockBackend::scripted([
            "a.ts",
            "#### a.ts\n```typescript\nedited a\n```\n\n#### CHANGE_SUMMARY.md\n```markdown\nRewrote a.ts.\n```",
        ]));
        let engine = engine_with(mock.clone());
        let mut session = session_with_bundle();

        let outcome = engine.apply(&mut session, "rewrite a").await.unwrap();

        assert_eq!(outcome.affected, ["a.ts"]);
        assert_eq!(outcome.files.get("a.ts"), Some("edited a"));
        assert_eq!(outcome.files.get("b.ts"), Some("original b"));
        assert!(!outcome.files.contains(CHANGE_SUMMARY_PATH));
        assert_eq!(outcome.summary.as_deref(), Some("Rewrote a.ts."));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn hallucinated_paths_are_dropped() {
        let mock = Arc::new(MockBackend::scripted([
            "a.ts\nimaginary/file.ts",
            "#### a.ts\n```typescript\nedited a\n```",
        ]));
        let engine = engine_with(mock);
        let mut session = session_with_bundle();

        let outcome = engine.apply(&mut session, "tweak a").await.unwrap();
        assert_eq!(outcome.affected, ["a.ts"]);
    }

    #[tokio::test]
    async fn all_hallucinated_paths_fail_without_retry() {
        let mock = Arc::new(MockBackend::scripted(["imaginary/file.ts\nanother/fake.ts"]));
        let engine = engine_with(mock.clone());
        let mut session = session_with_bundle();

        let err = engine.apply(&mut session, "change things").await.unwrap_err();
        assert!(matches!(err, ForgeError::NoAffectedFiles));
        // Step B never ran.
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn selection_reply_with_bullets_and_backticks_parses() {
        let mock = Arc::new(MockBackend::scripted([
            "- `a.ts`\n- `b.ts`",
            "#### a.ts\n```typescript\nnew a\n```\n#### b.ts\n```typescript\nnew b\n```",
        ]));
        let engine = engine_with(mock);
        let mut session = session_with_bundle();

        let outcome = engine.apply(&mut session, "touch both").await.unwrap();
        assert_eq!(outcome.affected, ["a.ts", "b.ts"]);
        assert_eq!(outcome.files.get("b.ts"), Some("new b"));
    }

    #[tokio::test]
    async fn session_without_bundle_has_no_known_files() {
        let mock = Arc::new(MockBackend::scripted(["a.ts"]));
        let engine = engine_with(mock.clone());
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        let err = engine.apply(&mut session, "change it").await.unwrap_err();
        assert!(matches!(err, ForgeError::NoAffectedFiles));
        assert_eq!(mock.call_count(), 0);
    }
}
