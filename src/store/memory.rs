//! In-process store. Used by tests and for running without a database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CredentialRecord, CredentialStore, JournalChanges, JournalEntry, JournalStore, Mood,
    MoodChanges, MoodStore, NewJournalEntry, NewMood, NewTask, NewUser, SignupOutcome, Store, Task,
    TaskChanges, TaskStore,
};

struct Owned<T> {
    owner: String,
    record: T,
}

#[derive(Default)]
struct Inner {
    // keyed by normalized email
    users: HashMap<String, CredentialRecord>,
    tasks: Vec<Owned<Task>>,
    moods: Vec<Owned<Mood>>,
    journal: Vec<Owned<JournalEntry>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

fn owned_by<'a, T>(
    records: &'a [Owned<T>],
    owner: &'a str,
) -> impl DoubleEndedIterator<Item = &'a T> + 'a {
    records
        .iter()
        .filter(move |entry| entry.owner == owner)
        .map(|entry| &entry.record)
}

fn find_owned<'a, T>(
    records: &'a mut [Owned<T>],
    owner: &str,
    matches: impl Fn(&T) -> bool,
) -> Option<&'a mut T> {
    records
        .iter_mut()
        .find(|entry| entry.owner == owner && matches(&entry.record))
        .map(|entry| &mut entry.record)
}

fn remove_owned<T>(records: &mut Vec<Owned<T>>, owner: &str, matches: impl Fn(&T) -> bool) -> bool {
    let before = records.len();
    records.retain(|entry| !(entry.owner == owner && matches(&entry.record)));
    records.len() != before
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.inner.read().await.users.get(email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<SignupOutcome> {
        let mut inner = self.inner.write().await;
        let taken = inner.users.contains_key(&user.email)
            || inner
                .users
                .values()
                .any(|existing| existing.username == user.username);
        if taken {
            return Ok(SignupOutcome::Conflict);
        }

        inner.users.insert(
            user.email.clone(),
            CredentialRecord {
                id: Uuid::now_v7(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
            },
        );
        Ok(SignupOutcome::Created)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = owned_by(&inner.tasks, owner).cloned().collect();
        // no due date sorts last
        tasks.sort_by_key(|task| (task.due_date.is_none(), task.due_date, task.created_at));
        Ok(tasks)
    }

    async fn create_task(&self, owner: &str, task: NewTask) -> Result<Task> {
        let now = Utc::now();
        let record = Task {
            id: Uuid::now_v7(),
            title: task.title,
            completed: task.completed,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.tasks.push(Owned {
            owner: owner.to_string(),
            record: record.clone(),
        });
        Ok(record)
    }

    async fn update_task(
        &self,
        owner: &str,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>> {
        let mut inner = self.inner.write().await;
        let Some(task) = find_owned(&mut inner.tasks, owner, |task| task.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(completed) = changes.completed {
            task.completed = completed;
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, owner: &str, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_owned(&mut inner.tasks, owner, |task| task.id == id))
    }
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn list_moods(&self, owner: &str) -> Result<Vec<Mood>> {
        let inner = self.inner.read().await;
        // newest insert first, then a stable sort keeps that order for equal timestamps
        let mut moods: Vec<Mood> = owned_by(&inner.moods, owner).rev().cloned().collect();
        moods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(moods)
    }

    async fn create_mood(&self, owner: &str, mood: NewMood) -> Result<Mood> {
        let now = Utc::now();
        let record = Mood {
            id: Uuid::now_v7(),
            mood: mood.mood,
            note: mood.note,
            date: mood.date,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.moods.push(Owned {
            owner: owner.to_string(),
            record: record.clone(),
        });
        Ok(record)
    }

    async fn update_mood(
        &self,
        owner: &str,
        id: Uuid,
        changes: MoodChanges,
    ) -> Result<Option<Mood>> {
        let mut inner = self.inner.write().await;
        let Some(mood) = find_owned(&mut inner.moods, owner, |mood| mood.id == id) else {
            return Ok(None);
        };
        if let Some(value) = changes.mood {
            mood.mood = value;
        }
        if let Some(note) = changes.note {
            mood.note = note;
        }
        if let Some(date) = changes.date {
            mood.date = date;
        }
        mood.updated_at = Utc::now();
        Ok(Some(mood.clone()))
    }

    async fn delete_mood(&self, owner: &str, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_owned(&mut inner.moods, owner, |mood| mood.id == id))
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn list_journal(&self, owner: &str) -> Result<Vec<JournalEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<JournalEntry> =
            owned_by(&inner.journal, owner).rev().cloned().collect();
        entries.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(entries)
    }

    async fn get_journal_entry(&self, owner: &str, id: Uuid) -> Result<Option<JournalEntry>> {
        let inner = self.inner.read().await;
        Ok(owned_by(&inner.journal, owner)
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn create_journal_entry(
        &self,
        owner: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry> {
        let now = Utc::now();
        let record = JournalEntry {
            id: Uuid::now_v7(),
            title: entry.title,
            content: entry.content,
            date: entry.date,
            mood: entry.mood,
            tags: entry.tags,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.journal.push(Owned {
            owner: owner.to_string(),
            record: record.clone(),
        });
        Ok(record)
    }

    async fn update_journal_entry(
        &self,
        owner: &str,
        id: Uuid,
        changes: JournalChanges,
    ) -> Result<Option<JournalEntry>> {
        let mut inner = self.inner.write().await;
        let Some(entry) = find_owned(&mut inner.journal, owner, |entry| entry.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            entry.title = title;
        }
        if let Some(content) = changes.content {
            entry.content = content;
        }
        if let Some(date) = changes.date {
            entry.date = date;
        }
        if let Some(mood) = changes.mood {
            entry.mood = mood;
        }
        if let Some(tags) = changes.tags {
            entry.tags = tags;
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_journal_entry(&self, owner: &str, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_owned(&mut inner.journal, owner, |entry| entry.id == id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
