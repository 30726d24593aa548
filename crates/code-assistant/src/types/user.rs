//! User accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Encoded password hash, never serialized
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, username: String, hashed_password: String, full_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            hashed_password,
            full_name,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
