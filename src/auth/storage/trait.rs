//! 存储层trait定义

use async_trait::async_trait;
use crate::auth::{types::LocalUser, errors::AuthError};

/// user存储trait
///
/// `external_id` is the natural key. `insert` does not check for duplicates;
/// callers that cannot rule out a concurrent first login use `insert_or_fetch_id`.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// 通过openid查找User ID
    async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<i64>, AuthError>;

    /// 插入新user（默认权限 USER），返回分配的ID
    async fn insert(&self, external_id: &str, session_secret: &str) -> Result<i64, AuthError>;

    /// 通过ID查找user
    async fn find_by_id(&self, id: i64) -> Result<Option<LocalUser>, AuthError>;

    /// Inserts the user unless one already exists for `external_id`, then reads its id back.
    ///
    /// The default is a plain check-then-insert; backends override it with an atomic version.
    async fn insert_or_fetch_id(
        &self,
        external_id: &str,
        session_secret: &str,
    ) -> Result<Option<i64>, AuthError> {
        if let Some(id) = self.find_id_by_external_id(external_id).await? {
            return Ok(Some(id));
        }
        self.insert(external_id, session_secret).await?;
        self.find_id_by_external_id(external_id).await
    }

    /// user总数
    async fn count(&self) -> Result<u64, AuthError>;
}
