//! Chat orchestration: session bookkeeping, retrieval and answer generation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::prompt::{DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE};
use crate::providers::{GenerationService, RetrievalService};
use crate::storage::Database;
use crate::types::{ChatSession, HistoryTurn, Message, SourceCitation};

/// Passages retrieved per question
pub const RETRIEVAL_TOP_K: usize = 5;

/// Prior messages handed to the model
pub const HISTORY_LIMIT: usize = 10;

/// A question from the client
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

fn default_use_rag() -> bool {
    true
}

/// The answer with its citations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
    pub session_id: Uuid,
    pub response_time_ms: u64,
}

/// Runs one question through retrieval and generation, persisting both turns
pub struct ChatOrchestrator {
    db: Database,
    retrieval: Arc<dyn RetrievalService>,
    generation: Arc<dyn GenerationService>,
    top_k: usize,
}

impl ChatOrchestrator {
    pub fn new(
        db: Database,
        retrieval: Arc<dyn RetrievalService>,
        generation: Arc<dyn GenerationService>,
    ) -> Self {
        Self {
            db,
            retrieval,
            generation,
            top_k: RETRIEVAL_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Answer a question. New sessions are owned by `user_id` when given.
    pub async fn ask(&self, request: ChatRequest, user_id: Option<Uuid>) -> Result<ChatResponse> {
        let start = Instant::now();
        let query = request.query.as_str();
        if query.trim().is_empty() {
            return Err(Error::bad_request("Query must not be empty"));
        }

        let session = self.resolve_session(request.session_id.as_deref(), query, user_id)?;

        let user_message = Message::user(session.id, query);
        self.db.append_message(&user_message)?;

        let (passages, sources) = if request.use_rag {
            self.retrieve(query).await
        } else {
            (Vec::new(), Vec::new())
        };

        let history: Vec<HistoryTurn> = self
            .db
            .recent_history(session.id, user_message.id, HISTORY_LIMIT)?
            .iter()
            .map(HistoryTurn::from)
            .collect();

        let generated = if passages.is_empty() {
            self.generation
                .generate(query, Some(DEFAULT_SYSTEM_PROMPT), DEFAULT_TEMPERATURE)
                .await
        } else {
            self.generation
                .generate_with_context(query, &passages, &history)
                .await
        };

        let answer = generated.map_err(|e| {
            tracing::error!("Generation failed for session {}: {}", session.id, e);
            Error::ServiceUnavailable(format!("Language model unavailable: {}", e))
        })?;

        let response_time_ms = start.elapsed().as_millis() as u64;
        let assistant = Message::assistant(session.id, answer.clone(), sources.clone(), response_time_ms);
        self.db.append_message(&assistant)?;

        tracing::info!(
            "Answered in session {} with {} sources in {}ms",
            session.id,
            sources.len(),
            response_time_ms
        );

        Ok(ChatResponse {
            answer,
            sources,
            session_id: session.id,
            response_time_ms,
        })
    }

    fn resolve_session(&self, session_id: Option<&str>, query: &str, user_id: Option<Uuid>) -> Result<ChatSession> {
        match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let id = Uuid::parse_str(raw).map_err(|_| Error::not_found("Session", raw))?;
                self.db
                    .get_session(id)?
                    .ok_or_else(|| Error::not_found("Session", id))
            }
            None => {
                let session = ChatSession::from_query(query, user_id);
                self.db.create_session(&session)?;
                tracing::debug!("Created session {} ({})", session.id, session.title);
                Ok(session)
            }
        }
    }

    /// Passages for the model plus citations for the client. Failures degrade to none.
    async fn retrieve(&self, query: &str) -> (Vec<String>, Vec<SourceCitation>) {
        if !self.retrieval.is_ready() {
            return (Vec::new(), Vec::new());
        }

        match self.retrieval.search(query, self.top_k).await {
            Ok(hits) => {
                let sources = hits
                    .iter()
                    .map(|hit| {
                        SourceCitation::new(&hit.content, hit.source.clone(), hit.document_id().map(str::to_string))
                    })
                    .collect();
                let passages = hits.into_iter().map(|hit| hit.content).collect();
                (passages, sources)
            }
            Err(e) => {
                tracing::warn!("Retrieval failed, answering without context: {}", e);
                (Vec::new(), Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{DocumentMetadata, SearchHit};
    use crate::types::MessageRole;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;

    struct FixedRetrieval {
        hits: Vec<SearchHit>,
        ready: bool,
        fail: bool,
    }

    #[async_trait]
    impl RetrievalService for FixedRetrieval {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }

        async fn search(&self, _query: &str, k: usize) -> Result<Vec<SearchHit>> {
            if self.fail {
                return Err(Error::retrieval("index corrupted"));
            }
            Ok(self.hits.iter().take(k).cloned().collect())
        }

        async fn add_document(&self, _: &Path, _: &str, _: DocumentMetadata) -> Result<usize> {
            Ok(0)
        }

        async fn delete_document(&self, _: &str) -> Result<usize> {
            Ok(0)
        }

        async fn statistics(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    /// Records which generation path was taken
    #[derive(Default)]
    struct ScriptedGenerator {
        calls: Mutex<Vec<String>>,
        history_seen: Mutex<Vec<HistoryTurn>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerationService for ScriptedGenerator {
        async fn generate(&self, prompt: &str, system_prompt: Option<&str>, temperature: f32) -> Result<String> {
            if self.fail {
                return Err(Error::llm("connection refused"));
            }
            assert_eq!(system_prompt, Some(DEFAULT_SYSTEM_PROMPT));
            assert!((temperature - 0.7).abs() < f32::EPSILON);
            self.calls.lock().push(format!("plain:{}", prompt));
            Ok("plain answer".to_string())
        }

        async fn generate_with_context(
            &self,
            question: &str,
            passages: &[String],
            history: &[HistoryTurn],
        ) -> Result<String> {
            if self.fail {
                return Err(Error::llm("connection refused"));
            }
            self.calls.lock().push(format!("context:{}:{}", question, passages.len()));
            *self.history_seen.lock() = history.to_vec();
            Ok("grounded answer".to_string())
        }

        async fn generate_code(&self, _description: &str, _language: &str) -> Result<String> {
            Ok(String::new())
        }

        fn is_connected(&self) -> bool {
            !self.fail
        }

        async fn check_connection(&self) -> bool {
            !self.fail
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn hit(content: &str) -> SearchHit {
        SearchHit {
            content: content.to_string(),
            source: "guide.md".to_string(),
            metadata: [("document_id".to_string(), "doc-1".to_string())].into(),
            score: 0.9,
        }
    }

    fn orchestrator(retrieval: FixedRetrieval, generator: Arc<ScriptedGenerator>) -> (ChatOrchestrator, Database) {
        let db = Database::in_memory().unwrap();
        (ChatOrchestrator::new(db.clone(), Arc::new(retrieval), generator), db)
    }

    fn request(query: &str, session_id: Option<String>) -> ChatRequest {
        ChatRequest {
            query: query.to_string(),
            session_id,
            use_rag: true,
        }
    }

    fn empty_retrieval() -> FixedRetrieval {
        FixedRetrieval {
            hits: Vec::new(),
            ready: true,
            fail: false,
        }
    }

    #[tokio::test]
    async fn test_new_session_titled_with_query() {
        let generator = Arc::new(ScriptedGenerator::default());
        let (chat, db) = orchestrator(empty_retrieval(), generator.clone());

        let response = chat.ask(request("What is a binary search?", None), None).await.unwrap();
        assert_eq!(response.answer, "plain answer");
        assert!(response.sources.is_empty());

        let session = db.get_session(response.session_id).unwrap().unwrap();
        assert_eq!(session.title, "What is a binary search?");
        assert_eq!(db.list_sessions(None, 20).unwrap().len(), 1);

        let messages = db.list_messages(response.session_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(generator.calls.lock().as_slice(), ["plain:What is a binary search?"]);
    }

    #[tokio::test]
    async fn test_query_text_kept_verbatim() {
        let generator = Arc::new(ScriptedGenerator::default());
        let (chat, db) = orchestrator(empty_retrieval(), generator.clone());

        let response = chat.ask(request("  explain traits \n", None), None).await.unwrap();

        let session = db.get_session(response.session_id).unwrap().unwrap();
        assert_eq!(session.title, "  explain traits \n");
        let messages = db.list_messages(response.session_id).unwrap();
        assert_eq!(messages[0].content, "  explain traits \n");
        assert_eq!(generator.calls.lock().as_slice(), ["plain:  explain traits \n"]);
    }

    #[tokio::test]
    async fn test_context_answer_with_citations_and_history() {
        let long = "x".repeat(500);
        let retrieval = FixedRetrieval {
            hits: vec![hit("Binary search halves the range."), hit(&long)],
            ready: true,
            fail: false,
        };
        let generator = Arc::new(ScriptedGenerator::default());
        let (chat, _db) = orchestrator(retrieval, generator.clone());

        let first = chat.ask(request("binary search?", None), None).await.unwrap();
        assert_eq!(first.answer, "grounded answer");
        assert_eq!(first.sources.len(), 2);
        assert_eq!(first.sources[0].content, "Binary search halves the range.");
        assert_eq!(first.sources[0].document_id.as_deref(), Some("doc-1"));
        assert_eq!(first.sources[1].content.chars().count(), 200);
        assert!(first.sources[1].content.ends_with("..."));
        assert!(generator.history_seen.lock().is_empty());

        let second = chat
            .ask(request("and its complexity?", Some(first.session_id.to_string())), None)
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);

        let history = generator.history_seen.lock().clone();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "binary search?");
        assert_eq!(history[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (chat, db) = orchestrator(empty_retrieval(), Arc::new(ScriptedGenerator::default()));
        let result = chat.ask(request("hi", Some(Uuid::new_v4().to_string())), None).await;
        assert!(matches!(result, Err(Error::NotFound { kind: "Session", .. })));

        let result = chat.ask(request("hi", Some("not-a-uuid".into())), None).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(db.list_sessions(None, 20).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (chat, db) = orchestrator(empty_retrieval(), Arc::new(ScriptedGenerator::default()));
        assert!(matches!(chat.ask(request("   ", None), None).await, Err(Error::BadRequest(_))));
        assert!(db.list_sessions(None, 20).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_user_message() {
        let generator = Arc::new(ScriptedGenerator {
            fail: true,
            ..Default::default()
        });
        let (chat, db) = orchestrator(empty_retrieval(), generator);

        let result = chat.ask(request("will this fail?", None), None).await;
        assert!(matches!(result, Err(Error::ServiceUnavailable(_))));

        let sessions = db.list_sessions(None, 20).unwrap();
        assert_eq!(sessions.len(), 1);
        let messages = db.list_messages(sessions[0].id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "will this fail?");
    }

    #[tokio::test]
    async fn test_retrieval_failure_and_not_ready_fall_back() {
        let failing = FixedRetrieval {
            hits: vec![hit("ignored")],
            ready: true,
            fail: true,
        };
        let generator = Arc::new(ScriptedGenerator::default());
        let (chat, _) = orchestrator(failing, generator.clone());
        let response = chat.ask(request("q1", None), None).await.unwrap();
        assert_eq!(response.answer, "plain answer");

        let not_ready = FixedRetrieval {
            hits: vec![hit("ignored")],
            ready: false,
            fail: false,
        };
        let (chat, _) = orchestrator(not_ready, generator.clone());
        let response = chat.ask(request("q2", None), None).await.unwrap();
        assert!(response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_session_owned_by_caller() {
        let (chat, db) = orchestrator(empty_retrieval(), Arc::new(ScriptedGenerator::default()));
        let user = crate::types::User::new("u@x.y".into(), "u".into(), String::new(), None);
        let user_id = user.id;
        db.create_user(&user).unwrap();

        let response = chat.ask(request("mine", None), Some(user_id)).await.unwrap();
        let session = db.get_session(response.session_id).unwrap().unwrap();
        assert_eq!(session.user_id, Some(user_id));
        assert_eq!(db.list_sessions(Some(user_id), 20).unwrap().len(), 1);
        assert!(db.list_sessions(Some(Uuid::new_v4()), 20).unwrap().is_empty());
    }
}
