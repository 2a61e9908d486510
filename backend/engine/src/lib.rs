pub mod continuation;
pub mod edit;
pub mod generator;
pub mod prompt;
pub mod retry;
pub mod throttle;

pub use continuation::{CompletionPipeline, CONTINUATION_MARKER, DEFAULT_MAX_CONTINUATIONS};
pub use edit::{EditEngine, EditOutcome, CHANGE_SUMMARY_PATH};
pub use generator::{Generation, GenerationConfig, Generator};
pub use retry::RetryPolicy;
pub use throttle::{estimate_tokens, TokenThrottle, DEFAULT_TOKENS_PER_MINUTE};
