use crate::error::StoreError;
use crate::store::models::{ConnectionRecord, LocalDraftRecord, NewDraft};
use crate::store::schema::{MIGRATIONS, SCHEMA_VERSION};
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info, warn};

/// Where the store lives and which schema version to bring it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub database_url: String,
    pub target_version: i64,
}

impl StoreOptions {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            target_version: SCHEMA_VERSION,
        }
    }

    /// Open at an older layout. Used by tooling and upgrade tests.
    pub fn at_version(mut self, target_version: i64) -> Self {
        self.target_version = target_version;
        self
    }
}

#[derive(Debug)]
pub enum StoreMessage {
    /// Insert or overwrite by `friendly_name`.
    UpsertConnection(ConnectionRecord, RpcReplyPort<Result<(), StoreError>>),

    GetConnection(String, RpcReplyPort<Result<Option<ConnectionRecord>, StoreError>>),

    /// Delete by `friendly_name`; absent names are not an error.
    DeleteConnection(String, RpcReplyPort<Result<(), StoreError>>),

    ListConnectionNames(RpcReplyPort<Result<Vec<String>, StoreError>>),

    /// Insert a draft and return its freshly assigned id.
    InsertDraft(NewDraft, RpcReplyPort<Result<i64, StoreError>>),

    UpsertDraft(LocalDraftRecord, RpcReplyPort<Result<(), StoreError>>),

    ListDrafts(RpcReplyPort<Result<Vec<LocalDraftRecord>, StoreError>>),

    DeleteDraft(i64, RpcReplyPort<Result<(), StoreError>>),

    /// Current on-disk `user_version`.
    SchemaVersion(RpcReplyPort<Result<i64, StoreError>>),
}

/// Cloneable handle to the store actor. Safe to share between tasks.
#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

impl StoreHandle {
    pub async fn upsert_connection(&self, record: ConnectionRecord) -> Result<(), StoreError> {
        ractor::call!(self.actor, StoreMessage::UpsertConnection, record).map_err(|e| {
            StoreError::Actor(format!("StoreActor UpsertConnection RPC failed: {e}"))
        })?
    }

    pub async fn get_connection(
        &self,
        friendly_name: &str,
    ) -> Result<Option<ConnectionRecord>, StoreError> {
        ractor::call!(
            self.actor,
            StoreMessage::GetConnection,
            friendly_name.to_string()
        )
        .map_err(|e| StoreError::Actor(format!("StoreActor GetConnection RPC failed: {e}")))?
    }

    pub async fn delete_connection(&self, friendly_name: &str) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            StoreMessage::DeleteConnection,
            friendly_name.to_string()
        )
        .map_err(|e| StoreError::Actor(format!("StoreActor DeleteConnection RPC failed: {e}")))?
    }

    pub async fn list_connection_names(&self) -> Result<Vec<String>, StoreError> {
        ractor::call!(self.actor, StoreMessage::ListConnectionNames).map_err(|e| {
            StoreError::Actor(format!("StoreActor ListConnectionNames RPC failed: {e}"))
        })?
    }

    pub async fn insert_draft(&self, draft: NewDraft) -> Result<i64, StoreError> {
        ractor::call!(self.actor, StoreMessage::InsertDraft, draft)
            .map_err(|e| StoreError::Actor(format!("StoreActor InsertDraft RPC failed: {e}")))?
    }

    pub async fn upsert_draft(&self, draft: LocalDraftRecord) -> Result<(), StoreError> {
        ractor::call!(self.actor, StoreMessage::UpsertDraft, draft)
            .map_err(|e| StoreError::Actor(format!("StoreActor UpsertDraft RPC failed: {e}")))?
    }

    pub async fn list_drafts(&self) -> Result<Vec<LocalDraftRecord>, StoreError> {
        ractor::call!(self.actor, StoreMessage::ListDrafts)
            .map_err(|e| StoreError::Actor(format!("StoreActor ListDrafts RPC failed: {e}")))?
    }

    pub async fn delete_draft(&self, id: i64) -> Result<(), StoreError> {
        ractor::call!(self.actor, StoreMessage::DeleteDraft, id)
            .map_err(|e| StoreError::Actor(format!("StoreActor DeleteDraft RPC failed: {e}")))?
    }

    pub async fn schema_version(&self) -> Result<i64, StoreError> {
        ractor::call!(self.actor, StoreMessage::SchemaVersion)
            .map_err(|e| StoreError::Actor(format!("StoreActor SchemaVersion RPC failed: {e}")))?
    }

    /// Stop the actor and close the pool. Other clones of this handle fail afterwards.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.actor
            .stop_and_wait(None, None)
            .await
            .map_err(|e| StoreError::Actor(format!("StoreActor stop failed: {e}")))
    }
}

struct StoreActorState {
    pool: SqlitePool,
}

struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = StoreActorState;
    type Arguments = StoreOptions;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        options: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        if !(1..=SCHEMA_VERSION).contains(&options.target_version) {
            return Err(ActorProcessingErr::from(format!(
                "unsupported schema version {} (this build knows 1..={SCHEMA_VERSION})",
                options.target_version
            )));
        }

        let connect_opts = SqliteConnectOptions::from_str(options.database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every statement already funnels through this actor; one connection also
        // keeps `sqlite::memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        let version = apply_migrations(&pool, options.target_version)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(schema_version = version, "StoreActor initialized");
        Ok(StoreActorState { pool })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.pool.close().await;
        debug!("StoreActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            StoreMessage::UpsertConnection(record, reply) => {
                let res = self.upsert_connection(&state.pool, record).await;
                let _ = reply.send(res);
            }
            StoreMessage::GetConnection(name, reply) => {
                let res = self.get_connection(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            StoreMessage::DeleteConnection(name, reply) => {
                let res = self.delete_connection(&state.pool, &name).await;
                let _ = reply.send(res);
            }
            StoreMessage::ListConnectionNames(reply) => {
                let res = self.list_connection_names(&state.pool).await;
                let _ = reply.send(res);
            }
            StoreMessage::InsertDraft(draft, reply) => {
                let res = self.insert_draft(&state.pool, draft).await;
                let _ = reply.send(res);
            }
            StoreMessage::UpsertDraft(draft, reply) => {
                let res = self.upsert_draft(&state.pool, draft).await;
                let _ = reply.send(res);
            }
            StoreMessage::ListDrafts(reply) => {
                let res = self.list_drafts(&state.pool).await;
                let _ = reply.send(res);
            }
            StoreMessage::DeleteDraft(id, reply) => {
                let res = self.delete_draft(&state.pool, id).await;
                let _ = reply.send(res);
            }
            StoreMessage::SchemaVersion(reply) => {
                let res = read_user_version(&state.pool).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl StoreActor {
    async fn upsert_connection(
        &self,
        pool: &SqlitePool,
        record: ConnectionRecord,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        debug!(
            friendly_name = %record.friendly_name,
            service_type = %record.service_type,
            "Upserting connection"
        );

        sqlx::query(
            r#"
        INSERT INTO connections (
            friendly_name, service_type, encrypted_key, endpoint, model, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(friendly_name) DO UPDATE SET
            service_type = excluded.service_type,
            encrypted_key = excluded.encrypted_key,
            endpoint = excluded.endpoint,
            model = excluded.model,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(record.friendly_name)
        .bind(record.service_type)
        .bind(record.encrypted_key)
        .bind(record.endpoint)
        .bind(record.model)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn get_connection(
        &self,
        pool: &SqlitePool,
        friendly_name: &str,
    ) -> Result<Option<ConnectionRecord>, StoreError> {
        let row = sqlx::query_as::<_, ConnectionRecord>(
            r#"
        SELECT friendly_name, service_type, encrypted_key, endpoint, model
        FROM connections
        WHERE friendly_name = ?
        "#,
        )
        .bind(friendly_name)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn delete_connection(
        &self,
        pool: &SqlitePool,
        friendly_name: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM connections WHERE friendly_name = ?")
            .bind(friendly_name)
            .execute(pool)
            .await?;

        debug!(
            friendly_name,
            removed = result.rows_affected(),
            "Deleted connection"
        );
        Ok(())
    }

    async fn list_connection_names(&self, pool: &SqlitePool) -> Result<Vec<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT friendly_name FROM connections ORDER BY friendly_name",
        )
        .fetch_all(pool)
        .await?;

        Ok(names)
    }

    async fn insert_draft(&self, pool: &SqlitePool, draft: NewDraft) -> Result<i64, StoreError> {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO drafts (title, content, is_public, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
        )
        .bind(draft.title)
        .bind(draft.content)
        .bind(draft.is_public)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        debug!(draft_id = id, "Inserted draft");
        Ok(id)
    }

    async fn upsert_draft(
        &self,
        pool: &SqlitePool,
        draft: LocalDraftRecord,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        sqlx::query(
            r#"
        INSERT INTO drafts (id, title, content, is_public, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            content = excluded.content,
            is_public = excluded.is_public,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(draft.id)
        .bind(draft.title)
        .bind(draft.content)
        .bind(draft.is_public)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn list_drafts(&self, pool: &SqlitePool) -> Result<Vec<LocalDraftRecord>, StoreError> {
        let rows = sqlx::query_as::<_, LocalDraftRecord>(
            r#"
        SELECT id, title, content, is_public
        FROM drafts
        ORDER BY id
        "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn delete_draft(&self, pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM drafts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

/// Spawn the store actor and return a cloneable handle once migrations have run.
pub async fn open(options: StoreOptions) -> Result<StoreHandle, StoreError> {
    let (actor, _jh) = Actor::spawn(None, StoreActor, options)
        .await
        .map_err(|e| StoreError::Open(e.to_string()))?;

    Ok(StoreHandle { actor })
}

async fn read_user_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Bring the database up to `target`, returning the resulting on-disk version.
///
/// A database already past `target` is left untouched.
async fn apply_migrations(pool: &SqlitePool, target: i64) -> Result<i64, StoreError> {
    let current = read_user_version(pool).await?;
    if current > target {
        warn!(
            on_disk = current,
            target, "Record store is newer than this build; opening without migration"
        );
        return Ok(current);
    }

    let mut version = current;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current && m.version <= target)
    {
        let step = |source| StoreError::Migration {
            version: migration.version,
            source,
        };

        let mut tx = pool.begin().await.map_err(step)?;
        for stmt in migration.statements {
            sqlx::query(stmt).execute(&mut *tx).await.map_err(step)?;
        }
        // PRAGMA does not accept bound parameters.
        let bump = format!("PRAGMA user_version = {}", migration.version);
        sqlx::query(&bump).execute(&mut *tx).await.map_err(step)?;
        tx.commit().await.map_err(step)?;

        info!(
            version = migration.version,
            description = migration.description,
            "Record store migrated"
        );
        version = migration.version;
    }

    Ok(version)
}
