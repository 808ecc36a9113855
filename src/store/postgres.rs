//! Postgres-backed store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, Span, info_span};
use uuid::Uuid;

use super::{
    CredentialRecord, CredentialStore, JournalChanges, JournalEntry, JournalStore, Mood,
    MoodChanges, MoodStore, NewJournalEntry, NewMood, NewTask, NewUser, SignupOutcome, Store, Task,
    TaskChanges, TaskStore,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const TASK_COLUMNS: &str = "id, title, completed, due_date, created_at, updated_at";
const MOOD_COLUMNS: &str = "id, mood, note, date, created_at, updated_at";
const JOURNAL_COLUMNS: &str = "id, title, content, date, mood, tags, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_span(operation: &str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Apply `sql/schema.sql`. Statements are idempotent.
///
/// # Errors
/// Returns an error if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .instrument(query_span("DDL", statement))
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn task_from_row(row: &PgRow) -> Result<Task, sqlx::Error> {
    Ok(Task {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        completed: row.try_get("completed")?,
        due_date: row.try_get("due_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn mood_from_row(row: &PgRow) -> Result<Mood, sqlx::Error> {
    Ok(Mood {
        id: row.try_get("id")?,
        mood: row.try_get("mood")?,
        note: row.try_get("note")?,
        date: row.try_get("date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn journal_from_row(row: &PgRow) -> Result<JournalEntry, sqlx::Error> {
    Ok(JournalEntry {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        date: row.try_get("date")?,
        mood: row.try_get("mood")?,
        tags: row.try_get("tags")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>> {
        let query = "SELECT id, username, email, password_hash FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to lookup user by email")?;

        row.map(|row| -> Result<CredentialRecord, sqlx::Error> {
            Ok(CredentialRecord {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                email: row.try_get("email")?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
        .context("failed to decode user row")
    }

    async fn insert_user(&self, user: NewUser) -> Result<SignupOutcome> {
        let query = "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)";
        let result = sqlx::query(query)
            .bind(Uuid::now_v7())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(SignupOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, owner: &str) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner = $1 ORDER BY due_date ASC NULLS LAST, created_at ASC"
        );
        let rows = sqlx::query(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list tasks")?;

        rows.iter()
            .map(task_from_row)
            .collect::<Result<_, _>>()
            .context("failed to decode task row")
    }

    async fn create_task(&self, owner: &str, task: NewTask) -> Result<Task> {
        let query = format!(
            "INSERT INTO tasks (id, owner, title, completed, due_date) VALUES ($1, $2, $3, $4, $5) RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(owner)
            .bind(&task.title)
            .bind(task.completed)
            .bind(task.due_date)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert task")?;

        task_from_row(&row).context("failed to decode task row")
    }

    async fn update_task(
        &self,
        owner: &str,
        id: Uuid,
        changes: TaskChanges,
    ) -> Result<Option<Task>> {
        let query = format!(
            r"
            UPDATE tasks SET
                title = COALESCE($3, title),
                completed = COALESCE($4, completed),
                due_date = CASE WHEN $6 THEN $5 ELSE due_date END,
                updated_at = NOW()
            WHERE id = $1 AND owner = $2
            RETURNING {TASK_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.completed)
            .bind(changes.due_date.flatten())
            .bind(changes.due_date.is_some())
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .context("failed to update task")?;

        row.as_ref()
            .map(task_from_row)
            .transpose()
            .context("failed to decode task row")
    }

    async fn delete_task(&self, owner: &str, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM tasks WHERE id = $1 AND owner = $2";
        let result = sqlx::query(query)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete task")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MoodStore for PgStore {
    async fn list_moods(&self, owner: &str) -> Result<Vec<Mood>> {
        let query =
            format!("SELECT {MOOD_COLUMNS} FROM moods WHERE owner = $1 ORDER BY created_at DESC");
        let rows = sqlx::query(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list moods")?;

        rows.iter()
            .map(mood_from_row)
            .collect::<Result<_, _>>()
            .context("failed to decode mood row")
    }

    async fn create_mood(&self, owner: &str, mood: NewMood) -> Result<Mood> {
        let query = format!(
            "INSERT INTO moods (id, owner, mood, note, date) VALUES ($1, $2, $3, $4, $5) RETURNING {MOOD_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(owner)
            .bind(&mood.mood)
            .bind(&mood.note)
            .bind(mood.date)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert mood")?;

        mood_from_row(&row).context("failed to decode mood row")
    }

    async fn update_mood(
        &self,
        owner: &str,
        id: Uuid,
        changes: MoodChanges,
    ) -> Result<Option<Mood>> {
        let query = format!(
            r"
            UPDATE moods SET
                mood = COALESCE($3, mood),
                note = COALESCE($4, note),
                date = COALESCE($5, date),
                updated_at = NOW()
            WHERE id = $1 AND owner = $2
            RETURNING {MOOD_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .bind(changes.mood)
            .bind(changes.note)
            .bind(changes.date)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .context("failed to update mood")?;

        row.as_ref()
            .map(mood_from_row)
            .transpose()
            .context("failed to decode mood row")
    }

    async fn delete_mood(&self, owner: &str, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM moods WHERE id = $1 AND owner = $2";
        let result = sqlx::query(query)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete mood")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JournalStore for PgStore {
    async fn list_journal(&self, owner: &str) -> Result<Vec<JournalEntry>> {
        let query = format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE owner = $1 ORDER BY date DESC, created_at DESC"
        );
        let rows = sqlx::query(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to list journal entries")?;

        rows.iter()
            .map(journal_from_row)
            .collect::<Result<_, _>>()
            .context("failed to decode journal row")
    }

    async fn get_journal_entry(&self, owner: &str, id: Uuid) -> Result<Option<JournalEntry>> {
        let query =
            format!("SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = $1 AND owner = $2");
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to fetch journal entry")?;

        row.as_ref()
            .map(journal_from_row)
            .transpose()
            .context("failed to decode journal row")
    }

    async fn create_journal_entry(
        &self,
        owner: &str,
        entry: NewJournalEntry,
    ) -> Result<JournalEntry> {
        let query = format!(
            r"
            INSERT INTO journal_entries (id, owner, title, content, date, mood, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {JOURNAL_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(owner)
            .bind(&entry.title)
            .bind(&entry.content)
            .bind(entry.date)
            .bind(&entry.mood)
            .bind(&entry.tags)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .context("failed to insert journal entry")?;

        journal_from_row(&row).context("failed to decode journal row")
    }

    async fn update_journal_entry(
        &self,
        owner: &str,
        id: Uuid,
        changes: JournalChanges,
    ) -> Result<Option<JournalEntry>> {
        let query = format!(
            r"
            UPDATE journal_entries SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                date = COALESCE($5, date),
                mood = COALESCE($6, mood),
                tags = COALESCE($7, tags),
                updated_at = NOW()
            WHERE id = $1 AND owner = $2
            RETURNING {JOURNAL_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.date)
            .bind(changes.mood)
            .bind(changes.tags)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .context("failed to update journal entry")?;

        row.as_ref()
            .map(journal_from_row)
            .transpose()
            .context("failed to decode journal row")
    }

    async fn delete_journal_entry(&self, owner: &str, id: Uuid) -> Result<bool> {
        let query = "DELETE FROM journal_entries WHERE id = $1 AND owner = $2";
        let result = sqlx::query(query)
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to delete journal entry")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }
}
