//! Records persisted by the stores and the inputs used to create or change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_JOURNAL_MOOD: &str = "neutral";

/// Stored user credentials. `password_hash` is an Argon2 PHC string.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .finish()
    }
}

/// A user about to be inserted; the email is already normalized.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Outcome when attempting to create a new user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Created,
    Conflict,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Mood {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub mood: String,
    pub note: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMood {
    pub mood: String,
    pub note: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct MoodChanges {
    pub mood: Option<String>,
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub mood: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub mood: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JournalChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub mood: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn task_serializes_with_client_field_names() -> Result<()> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::nil(),
            title: "write report".to_string(),
            completed: false,
            due_date: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&task)?;
        let object = value.as_object().context("task is not an object")?;
        assert!(object.contains_key("_id"));
        assert!(object.contains_key("dueDate"));
        assert!(object.contains_key("createdAt"));
        assert!(!object.contains_key("id"));
        Ok(())
    }

    #[test]
    fn credential_debug_redacts_hash() {
        let record = CredentialRecord {
            id: Uuid::nil(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };
        let debug = format!("{record:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("argon2id"));
    }
}
