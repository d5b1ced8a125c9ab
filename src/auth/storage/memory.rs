//! 内存存储实现（用于开发和测试）

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{
    errors::AuthError,
    types::{LocalUser, DEFAULT_AUTHORITY},
};
use super::r#trait::UserStorage;

#[derive(Default)]
struct Tables {
    /// 上一个分配的ID
    last_id: i64,
    /// id -> User
    users: HashMap<i64, LocalUser>,
    /// openid -> id
    external_index: HashMap<String, i64>,
}

impl Tables {
    fn insert(&mut self, external_id: &str, session_secret: &str) -> i64 {
        self.last_id += 1;
        let id = self.last_id;
        self.users.insert(
            id,
            LocalUser {
                id,
                external_id: external_id.to_string(),
                session_secret: session_secret.to_string(),
                display_name: None,
                avatar_ref: None,
                authorities: vec![DEFAULT_AUTHORITY.to_string()],
            },
        );
        // last writer wins on the index, mirroring a table without a unique constraint
        self.external_index.insert(external_id.to_string(), id);
        id
    }
}

/// 内存存储
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStorage for MemoryStorage {
    async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<i64>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.external_index.get(external_id).copied())
    }

    async fn insert(&self, external_id: &str, session_secret: &str) -> Result<i64, AuthError> {
        let mut tables = self.tables.write().await;
        let id = tables.insert(external_id, session_secret);
        info!("user已保存到内存存储: id={}", id);
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LocalUser>, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn insert_or_fetch_id(
        &self,
        external_id: &str,
        session_secret: &str,
    ) -> Result<Option<i64>, AuthError> {
        let mut tables = self.tables.write().await;
        if let Some(id) = tables.external_index.get(external_id) {
            return Ok(Some(*id));
        }
        let id = tables.insert(external_id, session_secret);
        info!("user已保存到内存存储: id={}", id);
        Ok(Some(id))
    }

    async fn count(&self) -> Result<u64, AuthError> {
        let tables = self.tables.read().await;
        Ok(tables.users.len() as u64)
    }
}
