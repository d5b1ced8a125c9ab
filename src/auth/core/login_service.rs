//! 微信登录业务逻辑
//!
//! code → provider identity → local user (created on first login) → token.

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    core::TokenService,
    errors::AuthError,
    providers::IdentityProvider,
    storage::UserStorage,
};

/// 登录服务
pub struct LoginService {
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn UserStorage>,
    tokens: Arc<TokenService>,
}

impl LoginService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn UserStorage>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self { provider, storage, tokens }
    }

    /// user登录，返回Access token
    ///
    /// Provider failures abort before the store is touched. The first login for an
    /// external id inserts exactly one row; later logins only read it.
    pub async fn login(&self, code: &str) -> Result<String, AuthError> {
        info!("业务逻辑: 处理微信登录 provider={}", self.provider.name());

        if code.trim().is_empty() {
            return Err(AuthError::ValidationError("code must not be empty".into()));
        }

        // 1. code换取身份
        let identity = self.provider.exchange(code).await?.ensure_valid()?;

        // 2. 查找或创建user
        let user_id = match self.storage.find_id_by_external_id(&identity.external_id).await? {
            Some(id) => id,
            None => self
                .storage
                .insert_or_fetch_id(&identity.external_id, &identity.session_secret)
                .await?
                .ok_or_else(|| {
                    warn!("user row missing right after insert");
                    AuthError::UserCreationFailed
                })?,
        };

        // 3. 读取完整user（包含数据库默认值）
        let user = self.storage.find_by_id(user_id).await?.ok_or_else(|| {
            warn!("user id {} not readable", user_id);
            AuthError::UserCreationFailed
        })?;

        // 4. 生成token
        let token = self.tokens.issue_for_user(&user)?;
        info!("✅ login succeeded: user_id={}", user.id);
        Ok(token)
    }
}
