pub mod error;
pub mod fileset;
pub mod message;
pub mod plan;
pub mod session;
pub mod traits;

pub use error::{BackendError, ForgeError};
pub use fileset::{normalize_path, FileSet, ProjectBundle};
pub use message::{ChatMessage, Role};
pub use plan::{Section, SectionPlan};
pub use session::Session;
pub use traits::{BundleStore, CompletionBackend, CompletionOptions};
