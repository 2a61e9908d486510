//! Staged generation orchestrator.

use std::sync::Arc;

use tracing::{info, instrument};

use stackforge_core::{
    ChatMessage, CompletionOptions, FileSet, ForgeError, ProjectBundle, SectionPlan, Session,
};
use stackforge_markdown::parse_project;

use crate::continuation::CompletionPipeline;
use crate::prompt;

/// Knobs for the generation flow.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub options: CompletionOptions,
    pub min_input_len: usize,
    pub plan: SectionPlan,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            options: CompletionOptions::default(),
            min_input_len: 10,
            plan: prompt::full_stack_plan(),
        }
    }
}

/// Result of one generation run.
///
/// `files` may legitimately be empty; the raw `document` is always
/// present, so callers can tell a degenerate parse from a failure.
#[derive(Debug, Clone)]
pub struct Generation {
    pub prompt: String,
    pub document: String,
    pub files: FileSet,
    pub readme: Option<String>,
}

/// Runs the staged section plan against the completion pipeline and turns
/// the accumulated document into a project bundle on the session.
pub struct Generator {
    pipeline: Arc<CompletionPipeline>,
    bundles: Arc<dyn stackforge_core::BundleStore>,
    config: GenerationConfig,
}

impl Generator {
    pub fn new(
        pipeline: Arc<CompletionPipeline>,
        bundles: Arc<dyn stackforge_core::BundleStore>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            pipeline,
            bundles,
            config,
        }
    }

    /// One requirement-refinement turn over the session history.
    ///
    /// The stored history keeps the generation persona at its head; the
    /// refinement persona is swapped in for the call only.
    pub async fn converse(
        &self,
        session: &mut Session,
        message: &str,
    ) -> Result<String, ForgeError> {
        session.push(ChatMessage::user(message));
        let mut messages = session.messages.clone();
        messages[0] = ChatMessage::system(prompt::CONVERSE_PERSONA);
        let reply = self
            .pipeline
            .complete_once(&messages, &self.config.options)
            .await?;
        session.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    /// Run the full section plan and attach the resulting bundle to the
    /// session. Each section's exchange is appended to the history before
    /// the next section runs, so every stage sees all prior output.
    #[instrument(skip(self, session, user_input), fields(session_id = %session.id))]
    pub async fn generate(
        &self,
        session: &mut Session,
        user_input: &str,
    ) -> Result<Generation, ForgeError> {
        let trimmed = user_input.trim();
        if trimmed.chars().count() < self.config.min_input_len {
            return Err(ForgeError::InputTooShort {
                len: trimmed.chars().count(),
                min: self.config.min_input_len,
            });
        }

        let base = prompt::base_prompt(trimmed);
        let mut document = String::new();

        for (index, section) in self.config.plan.sections().iter().enumerate() {
            info!(section = %section.name, "generating section");
            let task = prompt::section_prompt(&base, section, index == 0);
            session.push(ChatMessage::user(task));

            let output = self
                .pipeline
                .complete_reassembled(&session.messages, &self.config.options)
                .await?;
            session.push(ChatMessage::assistant(output.clone()));

            document.push_str(&format!(
                "\n\n---\n### {}\n\n{}",
                section.title(),
                output.trim()
            ));
        }

        let document = document.trim().to_string();
        let parsed = parse_project(&document);
        info!(
            files = parsed.files.len(),
            has_readme = parsed.readme.is_some(),
            "generation parsed"
        );

        let bundle = ProjectBundle::new(document.clone(), parsed.files.clone(), parsed.readme.clone());
        session.bundle = Some(bundle.clone());
        self.bundles.save(&session.id, &bundle).await?;

        Ok(Generation {
            prompt: base,
            document,
            files: parsed.files,
            readme: parsed.readme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::TokenThrottle;
    use stackforge_core::BundleStore;
    use stackforge_core::Role;
    use stackforge_provider::MockBackend;
    use stackforge_session::MemoryBundleStore;

    fn generator_with(mock: Arc<MockBackend>) -> (Generator, Arc<MemoryBundleStore>) {
        let pipeline = Arc::new(CompletionPipeline::new(
            mock,
            Arc::new(TokenThrottle::default()),
        ));
        let bundles = Arc::new(MemoryBundleStore::new());
        (
            Generator::new(pipeline, bundles.clone(), GenerationConfig::default()),
            bundles,
        )
    }

    fn two_section_generator(mock: Arc<MockBackend>) -> (Generator, Arc<MemoryBundleStore>) {
        let pipeline = Arc::new(CompletionPipeline::new(
            mock,
            Arc::new(TokenThrottle::default()),
        ));
        let bundles = Arc::new(MemoryBundleStore::new());
        let config = GenerationConfig {
            plan: SectionPlan::new()
                .with_section("overview", "describe the app")
                .with_section("code", "write the code"),
            ..Default::default()
        };
        (
            Generator::new(pipeline, bundles.clone(), config),
            bundles,
        )
    }

    #[tokio::test]
    async fn rejects_short_input_before_any_backend_call() {
        let mock = Arc::new(MockBackend::scripted(["never used"]));
        let (generator, _) = generator_with(mock.clone());
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        let err = generator.generate(&mut session, "todo").await.unwrap_err();
        assert!(matches!(err, ForgeError::InputTooShort { len: 4, min: 10 }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn runs_sections_in_order_and_builds_bundle() {
        let mock = Arc::new(MockBackend::scripted([
            "An overview of the app.",
            "#### src/index.js\n```javascript\nconsole.log('hi');\n```",
        ]));
        let (generator, bundles) = two_section_generator(mock.clone());
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        let generation = generator
            .generate(&mut session, "a todo app with tags")
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 2);
        // Document stitches sections in plan order under their titles.
        let overview_at = generation.document.find("### Overview").unwrap();
        let code_at = generation.document.find("### Code").unwrap();
        assert!(overview_at < code_at);
        assert_eq!(
            generation.files.get("src/index.js"),
            Some("console.log('hi');")
        );

        // Bundle landed on the session and in the store.
        assert!(session.bundle.is_some());
        assert!(bundles.load("s-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn later_sections_see_earlier_output_in_history() {
        let mock = Arc::new(MockBackend::scripted(["first section out", "second"]));
        let (generator, _) = two_section_generator(mock.clone());
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        generator
            .generate(&mut session, "a recipe sharing site")
            .await
            .unwrap();

        let calls = mock.calls();
        // Second call's history contains the first section's exchange.
        let second = &calls[1];
        assert!(second
            .iter()
            .any(|m| m.role == Role::Assistant && m.content == "first section out"));
        assert_eq!(second.last().unwrap().content, "write the code");
    }

    #[tokio::test]
    async fn empty_parse_is_success_with_preserved_document() {
        let mock = Arc::new(MockBackend::scripted(["no code blocks here", "still none"]));
        let (generator, _) = two_section_generator(mock);
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        let generation = generator
            .generate(&mut session, "a polling widget app")
            .await
            .unwrap();
        assert!(generation.files.is_empty());
        assert!(generation.document.contains("no code blocks here"));
    }

    #[tokio::test]
    async fn converse_appends_both_turns_under_refinement_persona() {
        let mock = Arc::new(MockBackend::scripted(["what data should it store?"]));
        let (generator, _) = generator_with(mock.clone());
        let mut session = Session::new("s-1", prompt::SYSTEM_PERSONA);

        let reply = generator
            .converse(&mut session, "I want a habit tracker")
            .await
            .unwrap();
        assert_eq!(reply, "what data should it store?");
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[2].role, Role::Assistant);

        // The call went out under the refinement persona, but the stored
        // history still opens with the generation persona.
        let call = &mock.calls()[0];
        assert_eq!(call[0].content, prompt::CONVERSE_PERSONA);
        assert_eq!(session.messages[0].content, prompt::SYSTEM_PERSONA);
    }
}
