//! 认证服务（整合层）

use std::sync::Arc;
use tracing::info;

use crate::auth::{
    config::AuthConfig,
    core::{LoginService, TokenService},
    errors::AuthError,
    providers::{IdentityProvider, WeChatProvider},
    storage::{SqliteStorage, UserStorage},
    types::AuthenticatedPrincipal,
};

/// 认证服务（门面模式）
pub struct AuthService {
    login_service: LoginService,
    token_service: Arc<TokenService>,
    config: AuthConfig,
}

impl AuthService {
    /// 使用注入的提供商和存储创建认证服务
    ///
    /// # Errors
    /// 返回`AuthError`如果TokenService创建failed
    pub fn new(
        config: AuthConfig,
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn UserStorage>,
    ) -> Result<Self, AuthError> {
        let token_service = Arc::new(TokenService::new(
            config.token.key.clone(),
            config.token.validity_secs,
        )?);

        Ok(Self::with_token_service(config, provider, storage, token_service))
    }

    /// Same as `new` with a prepared token codec (e.g. one driven by a test clock).
    pub fn with_token_service(
        config: AuthConfig,
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn UserStorage>,
        token_service: Arc<TokenService>,
    ) -> Self {
        let login_service = LoginService::new(provider, storage, token_service.clone());
        Self { login_service, token_service, config }
    }

    /// Production wiring: WeChat provider + SQLite store.
    pub async fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;

        let provider = Arc::new(WeChatProvider::new(&config.wechat)?);
        let storage = Arc::new(SqliteStorage::connect(&config.storage).await?);
        info!("认证服务初始化: provider={}", provider.name());

        Self::new(config, provider, storage)
    }

    /// user登录
    pub async fn login(&self, code: &str) -> Result<String, AuthError> {
        self.login_service.login(code).await
    }

    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        self.token_service.verify(token)
    }

    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}
