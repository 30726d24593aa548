//! Application state shared by the HTTP handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::chat::ChatOrchestrator;
use crate::config::AppConfig;
use crate::processing::JobQueue;
use crate::providers::{GenerationService, RetrievalService};
use crate::storage::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    db: Database,
    /// Retrieval collaborator (local vector index by default)
    retrieval: Arc<dyn RetrievalService>,
    /// Generation collaborator (Ollama by default)
    generation: Arc<dyn GenerationService>,
    /// Background ingestion queue
    job_queue: Arc<JobQueue>,
    auth: AuthService,
    chat: ChatOrchestrator,
}

impl AppState {
    /// Assemble state from already constructed collaborators
    pub fn new(
        config: AppConfig,
        db: Database,
        retrieval: Arc<dyn RetrievalService>,
        generation: Arc<dyn GenerationService>,
        job_queue: Arc<JobQueue>,
    ) -> Self {
        let auth = AuthService::new(db.clone(), config.auth.clone());
        let chat = ChatOrchestrator::new(db.clone(), retrieval.clone(), generation.clone())
            .with_top_k(config.retrieval.top_k);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                retrieval,
                generation,
                job_queue,
                auth,
                chat,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn retrieval(&self) -> &Arc<dyn RetrievalService> {
        &self.inner.retrieval
    }

    pub fn generation(&self) -> &Arc<dyn GenerationService> {
        &self.inner.generation
    }

    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn chat(&self) -> &ChatOrchestrator {
        &self.inner.chat
    }
}
