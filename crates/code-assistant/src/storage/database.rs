//! SQLite persistence for users, documents, chat sessions and messages

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{
    format_timestamp, parse_timestamp, ChatSession, Document, DocumentStatus, Message,
    MessageRole, SessionSummary, SourceCitation, User,
};

/// Result of background processing for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Completed { chunk_count: usize },
    Failed,
}

/// Row counts used by the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub total_users: usize,
    pub active_users: usize,
    pub total_documents: usize,
    pub completed_documents: usize,
    pub total_sessions: usize,
    pub total_messages: usize,
}

/// SQLite-backed application database
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

const DOCUMENT_COLUMNS: &str =
    "id, title, filename, file_path, owner_id, chunk_count, status, uploaded_at";
const SESSION_COLUMNS: &str = "id, user_id, title, created_at";
const MESSAGE_COLUMNS: &str =
    "id, session_id, role, content, sources_json, response_time_ms, created_at";
const USER_COLUMNS: &str =
    "id, email, username, hashed_password, full_name, is_active, created_at";

impl Database {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate(true)?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Internal(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate(false)?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self, wal: bool) -> Result<()> {
        let conn = self.conn.lock();

        if wal {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                "#,
            )
            .map_err(|e| Error::Internal(format!("Failed to set pragmas: {}", e)))?;
        }

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                full_name TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                filename TEXT NOT NULL,
                file_path TEXT NOT NULL,
                owner_id TEXT REFERENCES users(id) ON DELETE CASCADE,
                chunk_count INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending',
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
            CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);

            CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL DEFAULT 'New Chat',
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_sessions_created_at ON chat_sessions(created_at);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                sources_json TEXT NOT NULL DEFAULT '[]',
                response_time_ms INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, created_at);
            "#,
        )
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ==================== Users ====================

    /// Insert a user, rejecting a taken email or username
    pub fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();

        let email_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![user.email],
            |row| row.get(0),
        )?;
        if email_taken {
            return Err(Error::Conflict("Email already registered".to_string()));
        }

        let username_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![user.username],
            |row| row.get(0),
        )?;
        if username_taken {
            return Err(Error::Conflict("Username already taken".to_string()));
        }

        conn.execute(
            "INSERT INTO users (id, email, username, hashed_password, full_name, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.email,
                user.username,
                user.hashed_password,
                user.full_name,
                user.is_active,
                format_timestamp(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.find_user("id", &id.to_string())
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user("username", username)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user("email", email)
    }

    fn find_user(&self, column: &str, value: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
        let user = conn
            .query_row(&sql, params![value], row_to_user)
            .optional()?;
        Ok(user)
    }

    // ==================== Documents ====================

    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO documents (id, title, filename, file_path, owner_id, chunk_count, status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                doc.id.to_string(),
                doc.title,
                doc.filename,
                doc.file_path.to_string_lossy().into_owned(),
                doc.owner_id.map(|id| id.to_string()),
                doc.chunk_count as i64,
                doc.status.as_str(),
                format_timestamp(&doc.uploaded_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1");
        let doc = conn
            .query_row(&sql, params![id.to_string()], row_to_document)
            .optional()?;
        Ok(doc)
    }

    /// Documents owned by a user, newest first
    pub fn list_documents_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE owner_id = ?1
             ORDER BY uploaded_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![owner_id.to_string()], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Most recently uploaded documents across all users
    pub fn recent_documents(&self, limit: usize) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY uploaded_at DESC, rowid DESC LIMIT ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![limit as i64], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    pub fn delete_document(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])?;
        Ok(rows > 0)
    }

    /// Move a pending document to processing. Returns false when it was not pending.
    pub fn mark_processing(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "UPDATE documents SET status = 'processing' WHERE id = ?1 AND status = 'pending'",
            params![id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Record the outcome of processing.
    ///
    /// Only a pending or processing document transitions; a document already
    /// completed or failed (or deleted) is left untouched and `false` is returned.
    pub fn finish_processing(&self, id: Uuid, outcome: ProcessingOutcome) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = match outcome {
            ProcessingOutcome::Completed { chunk_count } => conn.execute(
                "UPDATE documents SET status = 'completed', chunk_count = ?2
                 WHERE id = ?1 AND status IN ('pending', 'processing')",
                params![id.to_string(), chunk_count as i64],
            )?,
            ProcessingOutcome::Failed => conn.execute(
                "UPDATE documents SET status = 'failed'
                 WHERE id = ?1 AND status IN ('pending', 'processing')",
                params![id.to_string()],
            )?,
        };
        Ok(rows > 0)
    }

    // ==================== Chat sessions ====================

    pub fn create_session(&self, session: &ChatSession) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chat_sessions (id, user_id, title, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                session.user_id.map(|id| id.to_string()),
                session.title,
                format_timestamp(&session.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, id: Uuid) -> Result<Option<ChatSession>> {
        let conn = self.conn.lock();
        let sql = format!("SELECT {SESSION_COLUMNS} FROM chat_sessions WHERE id = ?1");
        let session = conn
            .query_row(&sql, params![id.to_string()], row_to_session)
            .optional()?;
        Ok(session)
    }

    /// Newest sessions with their message counts, optionally restricted to one user
    pub fn list_sessions(&self, user_id: Option<Uuid>, limit: usize) -> Result<Vec<SessionSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT s.id, s.title, s.created_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.session_id = s.id)
             FROM chat_sessions s
             WHERE ?1 IS NULL OR s.user_id = ?1
             ORDER BY s.created_at DESC, s.rowid DESC
             LIMIT ?2",
        )?;
        let sessions = stmt
            .query_map(
                params![user_id.map(|id| id.to_string()), limit as i64],
                |row| {
                    let created_at: String = row.get(2)?;
                    let count: i64 = row.get(3)?;
                    Ok(SessionSummary {
                        id: uuid_column(row, 0)?,
                        title: row.get(1)?,
                        message_count: count as usize,
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Most recently created sessions across all users
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<ChatSession>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM chat_sessions ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        );
        let mut stmt = conn.prepare(&sql)?;
        let sessions = stmt
            .query_map(params![limit as i64], row_to_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Delete a session and, through the foreign key cascade, its messages
    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM chat_sessions WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ==================== Messages ====================

    pub fn append_message(&self, msg: &Message) -> Result<()> {
        let sources_json = serde_json::to_string(&msg.sources)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (id, session_id, role, content, sources_json, response_time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                msg.id.to_string(),
                msg.session_id.to_string(),
                msg.role.as_str(),
                msg.content,
                sources_json,
                msg.response_time_ms.map(|ms| ms as i64),
                format_timestamp(&msg.created_at),
            ],
        )?;
        Ok(())
    }

    /// All messages of a session in chronological order
    pub fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1
             ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![session_id.to_string()], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Up to `limit` latest messages of a session except `exclude`, oldest first
    pub fn recent_history(&self, session_id: Uuid, exclude: Uuid, limit: usize) -> Result<Vec<Message>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 AND id != ?2
             ORDER BY created_at DESC, rowid DESC LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut messages = stmt
            .query_map(
                params![session_id.to_string(), exclude.to_string(), limit as i64],
                row_to_message,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    // ==================== Admin ====================

    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreCounts {
            total_users: count("SELECT COUNT(*) FROM users")?,
            active_users: count("SELECT COUNT(*) FROM users WHERE is_active = 1")?,
            total_documents: count("SELECT COUNT(*) FROM documents")?,
            completed_documents: count("SELECT COUNT(*) FROM documents WHERE status = 'completed'")?,
            total_sessions: count("SELECT COUNT(*) FROM chat_sessions")?,
            total_messages: count("SELECT COUNT(*) FROM messages")?,
        })
    }
}

// ==================== Row mapping ====================

/// Read a text column holding a UUID; a malformed value fails the row
fn uuid_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    parse_uuid(idx, &raw)
}

fn opt_uuid_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_uuid(idx, &raw)).transpose()
}

fn parse_uuid(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let created_at: String = row.get(6)?;
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        hashed_password: row.get(3)?,
        full_name: row.get(4)?,
        is_active: row.get(5)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let file_path: String = row.get(3)?;
    let chunk_count: i64 = row.get(5)?;
    let status: String = row.get(6)?;
    let uploaded_at: String = row.get(7)?;
    Ok(Document {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        filename: row.get(2)?,
        file_path: file_path.into(),
        owner_id: opt_uuid_column(row, 4)?,
        chunk_count: chunk_count.max(0) as usize,
        status: DocumentStatus::parse(&status),
        uploaded_at: parse_timestamp(&uploaded_at),
    })
}

fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ChatSession> {
    let created_at: String = row.get(3)?;
    Ok(ChatSession {
        id: uuid_column(row, 0)?,
        user_id: opt_uuid_column(row, 1)?,
        title: row.get(2)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    let sources_json: String = row.get(4)?;
    let response_time_ms: Option<i64> = row.get(5)?;
    let created_at: String = row.get(6)?;
    let sources: Vec<SourceCitation> = serde_json::from_str(&sources_json).unwrap_or_default();
    Ok(Message {
        id: uuid_column(row, 0)?,
        session_id: uuid_column(row, 1)?,
        role: MessageRole::parse(&role),
        content: row.get(3)?,
        sources,
        response_time_ms: response_time_ms.map(|ms| ms.max(0) as u64),
        created_at: parse_timestamp(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_user(db: &Database, name: &str) -> User {
        let user = User::new(
            format!("{name}@example.com"),
            name.to_string(),
            "hash".to_string(),
            None,
        );
        db.create_user(&user).unwrap();
        user
    }

    fn test_document(db: &Database, owner: &User, name: &str) -> Document {
        let id = Uuid::new_v4();
        let doc = Document::new_upload(
            id,
            name.to_string(),
            PathBuf::from(format!("uploads/{id}_{name}")),
            Some(owner.id),
        );
        db.insert_document(&doc).unwrap();
        doc
    }

    #[test]
    fn test_user_uniqueness() {
        let db = Database::in_memory().unwrap();
        let alice = test_user(&db, "alice");

        let dup_email = User::new(alice.email.clone(), "other".into(), "h".into(), None);
        assert!(matches!(db.create_user(&dup_email), Err(Error::Conflict(_))));

        let dup_name = User::new("new@example.com".into(), "alice".into(), "h".into(), None);
        assert!(matches!(db.create_user(&dup_name), Err(Error::Conflict(_))));

        let found = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(found.is_active);
        assert!(db.get_user_by_email("alice@example.com").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_stored_id_is_an_error() {
        let db = Database::in_memory().unwrap();
        test_user(&db, "mallory");
        db.conn
            .lock()
            .execute("UPDATE users SET id = 'not-a-uuid' WHERE username = 'mallory'", [])
            .unwrap();

        assert!(matches!(db.get_user_by_username("mallory"), Err(Error::Database(_))));
    }

    #[test]
    fn test_document_listing_is_owner_scoped() {
        let db = Database::in_memory().unwrap();
        let alice = test_user(&db, "alice");
        let bob = test_user(&db, "bob");

        test_document(&db, &alice, "a.pdf");
        test_document(&db, &alice, "b.md");
        test_document(&db, &bob, "c.txt");

        let docs = db.list_documents_for_owner(alice.id).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "b.md");
        assert!(docs.iter().all(|d| d.owner_id == Some(alice.id)));
    }

    #[test]
    fn test_finish_processing_is_compare_and_set() {
        let db = Database::in_memory().unwrap();
        let alice = test_user(&db, "alice");
        let doc = test_document(&db, &alice, "notes.pdf");

        assert!(db
            .finish_processing(doc.id, ProcessingOutcome::Completed { chunk_count: 12 })
            .unwrap());
        assert!(!db.finish_processing(doc.id, ProcessingOutcome::Failed).unwrap());

        let stored = db.get_document(doc.id).unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Completed);
        assert_eq!(stored.chunk_count, 12);

        db.delete_document(doc.id).unwrap();
        assert!(!db.finish_processing(doc.id, ProcessingOutcome::Failed).unwrap());
    }

    #[test]
    fn test_mark_processing_only_from_pending() {
        let db = Database::in_memory().unwrap();
        let alice = test_user(&db, "alice");
        let mut doc = test_document(&db, &alice, "x.txt");
        assert!(!db.mark_processing(doc.id).unwrap());

        doc.id = Uuid::new_v4();
        doc.status = DocumentStatus::Pending;
        db.insert_document(&doc).unwrap();
        assert!(db.mark_processing(doc.id).unwrap());
    }

    #[test]
    fn test_session_delete_cascades_messages() {
        let db = Database::in_memory().unwrap();
        let session = ChatSession::from_query("hello", None);
        db.create_session(&session).unwrap();
        db.append_message(&Message::user(session.id, "hello")).unwrap();
        db.append_message(&Message::assistant(session.id, "hi", vec![], 5)).unwrap();

        assert_eq!(db.counts().unwrap().total_messages, 2);
        assert!(db.delete_session(session.id).unwrap());
        assert_eq!(db.counts().unwrap().total_messages, 0);
        assert!(db.get_session(session.id).unwrap().is_none());
        assert!(!db.delete_session(session.id).unwrap());
    }

    #[test]
    fn test_recent_history_excludes_message_and_is_chronological() {
        let db = Database::in_memory().unwrap();
        let session = ChatSession::from_query("q", None);
        db.create_session(&session).unwrap();

        for i in 0..12 {
            db.append_message(&Message::user(session.id, format!("m{i}"))).unwrap();
        }
        let latest = Message::user(session.id, "latest");
        db.append_message(&latest).unwrap();

        let history = db.recent_history(session.id, latest.id, 10).unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history.first().unwrap().content, "m2");
        assert_eq!(history.last().unwrap().content, "m11");
        assert!(history.iter().all(|m| m.id != latest.id));
    }

    #[test]
    fn test_list_sessions_counts_and_filters() {
        let db = Database::in_memory().unwrap();
        let alice = test_user(&db, "alice");

        let mine = ChatSession::from_query("mine", Some(alice.id));
        let anon = ChatSession::from_query("anon", None);
        db.create_session(&mine).unwrap();
        db.create_session(&anon).unwrap();
        db.append_message(&Message::user(mine.id, "one")).unwrap();

        let all = db.list_sessions(None, 20).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, anon.id);

        let scoped = db.list_sessions(Some(alice.id), 20).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].message_count, 1);
    }

    #[test]
    fn test_message_sources_persist() {
        let db = Database::in_memory().unwrap();
        let session = ChatSession::from_query("q", None);
        db.create_session(&session).unwrap();

        let citation = SourceCitation::new("passage", "notes.pdf", Some("doc-1".into()));
        db.append_message(&Message::assistant(session.id, "answer", vec![citation.clone()], 42))
            .unwrap();

        let messages = db.list_messages(session.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sources, vec![citation]);
        assert_eq!(messages[0].response_time_ms, Some(42));
        assert_eq!(messages[0].role, MessageRole::Assistant);
    }

    #[test]
    fn test_counts_on_empty_store() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.counts().unwrap(), StoreCounts::default());
        assert!(db.recent_documents(5).unwrap().is_empty());
        assert!(db.recent_sessions(5).unwrap().is_empty());
    }
}
