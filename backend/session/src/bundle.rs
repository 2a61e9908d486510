//! In-memory bundle store.
//!
//! Production deployments can swap in a persistent implementation of
//! `BundleStore`; the edit flow only depends on the trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use stackforge_core::{BundleStore, ForgeError, ProjectBundle};

#[derive(Default)]
pub struct MemoryBundleStore {
    bundles: RwLock<HashMap<String, ProjectBundle>>,
}

impl MemoryBundleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BundleStore for MemoryBundleStore {
    async fn save(&self, session_id: &str, bundle: &ProjectBundle) -> Result<(), ForgeError> {
        self.bundles
            .write()
            .await
            .insert(session_id.to_string(), bundle.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<ProjectBundle>, ForgeError> {
        Ok(self.bundles.read().await.get(session_id).cloned())
    }
}
