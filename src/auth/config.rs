//! 认证配置管理
//!
//! Values come from a TOML file (optional) with environment variables layered on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::auth::core::token_service::MAX_VALIDITY_SECS;
use crate::auth::errors::AuthError;

/// 认证配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub wechat: WeChatConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

/// Token签名配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC signing key
    pub key: String,
    /// Token validity in whole seconds
    pub validity_secs: u64,
}

/// 微信小程序配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeChatConfig {
    pub app_id: String,
    pub app_secret: String,
    pub api_base: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated list accepted
    pub cors_allow_origin: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            validity_secs: 7200, // 2小时
        }
    }
}

impl Default for WeChatConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            api_base: "https://api.weixin.qq.com".to_string(),
            connect_timeout_secs: 5,
            read_timeout_secs: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./users.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_allow_origin: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("key", &"[REDACTED]")
            .field("validity_secs", &self.validity_secs)
            .finish()
    }
}

impl fmt::Debug for WeChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeChatConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

impl AuthConfig {
    /// 解析TOML配置
    pub fn from_toml_str(content: &str) -> Result<Self, AuthError> {
        toml::from_str(content)
            .map_err(|e| AuthError::Configuration(format!("invalid config file: {}", e)))
    }

    /// from文件加载配置，环境变量优先
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// from环境变量加载配置
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TOKEN_KEY") {
            self.token.key = v;
        }
        if let Some(v) = env_parse("TOKEN_VALIDITY") {
            self.token.validity_secs = v;
        }
        if let Ok(v) = std::env::var("WECHAT_APPID") {
            self.wechat.app_id = v;
        }
        if let Ok(v) = std::env::var("WECHAT_SECRET") {
            self.wechat.app_secret = v;
        }
        if let Ok(v) = std::env::var("WECHAT_API_BASE") {
            self.wechat.api_base = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.storage.database_url = v;
        }
        if let Ok(v) = std::env::var("AUTH_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env_parse("AUTH_PORT") {
            self.server.port = v;
        }
        if let Ok(v) = std::env::var("CORS_ALLOW_ORIGIN") {
            self.server.cors_allow_origin = v;
        }
    }

    /// Rejects values the core cannot work with. Secrets are otherwise opaque.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token.key.is_empty() {
            return Err(AuthError::Configuration("token.key must not be empty".into()));
        }
        if self.token.validity_secs == 0 || self.token.validity_secs > MAX_VALIDITY_SECS {
            return Err(AuthError::Configuration(format!(
                "token.validity_secs must be between 1 and {}",
                MAX_VALIDITY_SECS
            )));
        }
        if self.wechat.app_id.is_empty() || self.wechat.app_secret.is_empty() {
            return Err(AuthError::Configuration(
                "wechat.app_id and wechat.app_secret must not be empty".into(),
            ));
        }
        if self.storage.database_url.is_empty() {
            return Err(AuthError::Configuration("storage.database_url must not be empty".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
