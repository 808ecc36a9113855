//! Persistence for credentials and user records.
//!
//! Handlers only see the [`Store`] trait object. [`PgStore`] is what the server
//! runs against; [`MemoryStore`] backs tests and local experiments. Uniqueness of
//! emails and usernames is enforced by the store itself, so two concurrent
//! registrations for the same email end with one `Conflict`.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
pub mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::{
    CredentialRecord, JournalChanges, JournalEntry, Mood, MoodChanges, NewJournalEntry, NewMood,
    NewTask, NewUser, SignupOutcome, Task, TaskChanges,
};
pub use postgres::{PgStore, ensure_schema};

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>>;

    /// Insert a user, reporting `Conflict` when the email or username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<SignupOutcome>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self, owner: &str) -> Result<Vec<Task>>;
    async fn create_task(&self, owner: &str, task: NewTask) -> Result<Task>;
    async fn update_task(&self, owner: &str, id: Uuid, changes: TaskChanges)
    -> Result<Option<Task>>;
    async fn delete_task(&self, owner: &str, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait MoodStore: Send + Sync {
    async fn list_moods(&self, owner: &str) -> Result<Vec<Mood>>;
    async fn create_mood(&self, owner: &str, mood: NewMood) -> Result<Mood>;
    async fn update_mood(&self, owner: &str, id: Uuid, changes: MoodChanges)
    -> Result<Option<Mood>>;
    async fn delete_mood(&self, owner: &str, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn list_journal(&self, owner: &str) -> Result<Vec<JournalEntry>>;
    async fn get_journal_entry(&self, owner: &str, id: Uuid) -> Result<Option<JournalEntry>>;
    async fn create_journal_entry(
        &self,
        owner: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry>;
    async fn update_journal_entry(
        &self,
        owner: &str,
        id: Uuid,
        changes: JournalChanges,
    ) -> Result<Option<JournalEntry>>;
    async fn delete_journal_entry(&self, owner: &str, id: Uuid) -> Result<bool>;
}

/// Everything the HTTP layer needs from persistence.
#[async_trait]
pub trait Store: CredentialStore + TaskStore + MoodStore + JournalStore {
    /// Cheap liveness check used by `/health`.
    async fn ping(&self) -> Result<()>;
}
