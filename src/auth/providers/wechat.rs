//! 微信小程序登录提供商
//!
//! 调用 `jscode2session` 接口，用临时登录凭证 code 换取 openid 和 session_key

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::{config::WeChatConfig, errors::AuthError, types::ProviderIdentity};
use super::r#trait::IdentityProvider;

const SESSION_PATH: &str = "/sns/jscode2session";

/// 微信提供商
pub struct WeChatProvider {
    client: reqwest::Client,
    app_id: String,
    app_secret: zeroize::Zeroizing<String>,
    session_url: String,
}

impl WeChatProvider {
    /// 创建新的微信提供商
    pub fn new(config: &WeChatConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(
                config.connect_timeout_secs + config.read_timeout_secs,
            ))
            .build()
            .map_err(|e| AuthError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            app_id: config.app_id.clone(),
            app_secret: zeroize::Zeroizing::new(config.app_secret.clone()),
            session_url: format!("{}{}", config.api_base.trim_end_matches('/'), SESSION_PATH),
        })
    }
}

/// Decodes a `jscode2session` body. The endpoint labels JSON as `text/plain`, so the
/// content type is ignored.
pub(crate) fn decode_session(body: &[u8]) -> Result<ProviderIdentity, AuthError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| AuthError::ProviderUnavailable("response is not UTF-8".into()))?
        .trim();
    if text.is_empty() || text == "null" {
        return Err(AuthError::ProviderResponseEmpty);
    }

    let identity: ProviderIdentity = serde_json::from_str(text)
        .map_err(|e| AuthError::ProviderUnavailable(format!("解析响应failed: {}", e)))?;
    identity.ensure_valid()
}

#[async_trait]
impl IdentityProvider for WeChatProvider {
    fn name(&self) -> &str {
        "wechat"
    }

    async fn exchange(&self, code: &str) -> Result<ProviderIdentity, AuthError> {
        if code.is_empty() {
            return Err(AuthError::ValidationError("code must not be empty".into()));
        }

        let response = self
            .client
            .get(&self.session_url)
            .query(&[
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| {
                // reqwest errors may embed the URL, which carries the app secret
                let e = e.without_url();
                if e.is_timeout() {
                    warn!("WeChat API request timed out");
                    AuthError::ProviderUnavailable("request timed out".into())
                } else {
                    warn!("WeChat API request failed: {}", e);
                    AuthError::ProviderUnavailable(format!("HTTP request fail: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("WeChat API returned HTTP {}", status);
            return Err(AuthError::ProviderUnavailable(format!("HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("读取响应failed: {}", e.without_url())))?;

        match decode_session(&body) {
            Ok(identity) => {
                info!("✅ WeChat code exchange succeeded");
                Ok(identity)
            }
            Err(e) => {
                warn!(error_code = e.error_code(), "WeChat code exchange failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let identity = decode_session(br#"{"openid":"wx-1","session_key":"sk-1","errcode":0}"#).unwrap();
        assert_eq!(identity.external_id, "wx-1");
        assert_eq!(identity.session_secret, "sk-1");
    }

    #[test]
    fn test_decode_error_code() {
        let err = decode_session(br#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap_err();
        assert!(matches!(err, AuthError::ProviderRejected { code: 40029, .. }));
        assert_eq!(err.to_string(), "invalid code");
    }

    #[test]
    fn test_decode_empty_bodies() {
        assert!(matches!(decode_session(b""), Err(AuthError::ProviderResponseEmpty)));
        assert!(matches!(decode_session(b"  \n"), Err(AuthError::ProviderResponseEmpty)));
        assert!(matches!(decode_session(b"null"), Err(AuthError::ProviderResponseEmpty)));
        assert!(matches!(decode_session(b"{}"), Err(AuthError::ProviderResponseEmpty)));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_session(b"<html>"), Err(AuthError::ProviderUnavailable(_))));
    }

    #[test]
    fn test_session_url_joins_base() {
        let config = WeChatConfig {
            app_id: "app".into(),
            app_secret: "secret".into(),
            api_base: "http://127.0.0.1:9/".into(),
            ..WeChatConfig::default()
        };
        let provider = WeChatProvider::new(&config).unwrap();
        assert_eq!(provider.session_url, "http://127.0.0.1:9/sns/jscode2session");
        assert_eq!(provider.name(), "wechat");
    }

    #[tokio::test]
    async fn test_empty_code_rejected_before_network() {
        let provider = WeChatProvider::new(&WeChatConfig::default()).unwrap();
        let err = provider.exchange("").await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }
}
