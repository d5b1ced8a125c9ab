//! SQLite存储实现
//!
//! Table `wechat_users`, with `openid` as a UNIQUE natural key and authorities kept
//! as a comma-separated `auth` column.

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    FromRow, SqlitePool,
};
use std::str::FromStr;
use tracing::info;

use crate::auth::{
    config::StorageConfig,
    errors::AuthError,
    types::{parse_authorities, LocalUser, DEFAULT_AUTHORITY},
};
use super::r#trait::UserStorage;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    openid: String,
    session_key: String,
    nickname: Option<String>,
    avatar_url: Option<String>,
    auth: Option<String>,
}

impl From<UserRow> for LocalUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            external_id: row.openid,
            session_secret: row.session_key,
            display_name: row.nickname,
            avatar_ref: row.avatar_url,
            authorities: row.auth.as_deref().map(parse_authorities).unwrap_or_default(),
        }
    }
}

/// SQLite存储
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// 连接数据库并运行迁移
    pub async fn connect(config: &StorageConfig) -> Result<Self, AuthError> {
        info!("📂 Initializing user database");

        let connect_options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| AuthError::Configuration(format!("invalid database URL: {}", e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
        if config.database_url.contains(":memory:") {
            // every connection to :memory: is a separate database; keep exactly one alive
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(connect_options).await?;
        let storage = Self { pool };
        storage.migrate().await?;

        info!("✅ User database initialization complete");
        Ok(storage)
    }

    /// Wraps an existing pool; runs migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, AuthError> {
        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> Result<(), AuthError> {
        sqlx::query(include_str!("../../../migrations/users/001_create_wechat_users.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get database connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserStorage for SqliteStorage {
    async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<i64>, AuthError> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM wechat_users WHERE openid = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert(&self, external_id: &str, session_secret: &str) -> Result<i64, AuthError> {
        let result = sqlx::query(
            "INSERT INTO wechat_users (openid, session_key, auth) VALUES (?, ?, ?)",
        )
        .bind(external_id)
        .bind(session_secret)
        .bind(DEFAULT_AUTHORITY)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("✅ User created: id={}", id);
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalUser>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, openid, session_key, nickname, avatar_url, auth FROM wechat_users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LocalUser::from))
    }

    async fn insert_or_fetch_id(
        &self,
        external_id: &str,
        session_secret: &str,
    ) -> Result<Option<i64>, AuthError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO wechat_users (openid, session_key, auth) VALUES (?, ?, ?) \
             ON CONFLICT(openid) DO NOTHING",
        )
        .bind(external_id)
        .bind(session_secret)
        .bind(DEFAULT_AUTHORITY)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM wechat_users WHERE openid = ?")
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted > 0 {
            info!("✅ User created: id={:?}", id);
        }
        Ok(id)
    }

    async fn count(&self) -> Result<u64, AuthError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wechat_users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_storage() -> (SqliteStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_url: format!("sqlite://{}", dir.path().join("users.db").display()),
            max_connections: 2,
        };
        (SqliteStorage::connect(&config).await.unwrap(), dir)
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let (storage, _dir) = temp_storage().await;

        assert_eq!(storage.find_id_by_external_id("wx-1").await.unwrap(), None);
        let id = storage.insert("wx-1", "sk-1").await.unwrap();
        assert_eq!(storage.find_id_by_external_id("wx-1").await.unwrap(), Some(id));

        let user = storage.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.external_id, "wx-1");
        assert_eq!(user.session_secret, "sk-1");
        assert_eq!(user.display_name, None);
        assert_eq!(user.authorities, vec!["USER"]);
    }

    #[tokio::test]
    async fn test_unique_openid_rejects_plain_duplicate_insert() {
        let (storage, _dir) = temp_storage().await;

        storage.insert("wx-1", "sk-1").await.unwrap();
        let dup = storage.insert("wx-1", "sk-2").await;
        assert!(matches!(dup, Err(AuthError::StorageError(_))));
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_or_fetch_id() {
        let (storage, _dir) = temp_storage().await;

        let first = storage.insert_or_fetch_id("wx-1", "sk-1").await.unwrap();
        let second = storage.insert_or_fetch_id("wx-1", "sk-2").await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(storage.count().await.unwrap(), 1);

        let user = storage.find_by_id(first.unwrap()).await.unwrap().unwrap();
        assert_eq!(user.session_secret, "sk-1");
    }

    #[tokio::test]
    async fn test_authorities_column_round_trips() {
        let (storage, _dir) = temp_storage().await;
        let id = storage.insert("wx-admin", "sk").await.unwrap();

        sqlx::query("UPDATE wechat_users SET auth = ?, nickname = ? WHERE id = ?")
            .bind("USER,ADMIN,USER")
            .bind("Alice")
            .bind(id)
            .execute(storage.pool())
            .await
            .unwrap();

        let user = storage.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.authorities, vec!["USER", "ADMIN"]);
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_login_creates_one_row() {
        let (storage, _dir) = temp_storage().await;

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.insert_or_fetch_id("wx-race", "sk").await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().unwrap());
        }

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(storage.count().await.unwrap(), 1);
        assert_eq!(storage.find_id_by_external_id("wx-race").await.unwrap(), Some(ids[0]));
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let config = StorageConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 5,
        };
        let storage = SqliteStorage::connect(&config).await.unwrap();
        let id = storage.insert_or_fetch_id("wx-mem", "sk").await.unwrap();
        assert!(storage.find_by_id(id.unwrap()).await.unwrap().is_some());
    }
}
