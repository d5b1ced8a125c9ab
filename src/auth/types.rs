//! 认证模块类型定义

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::errors::AuthError;

/// Role granted to every user on first login
pub const DEFAULT_AUTHORITY: &str = "USER";

/// Identity assertion returned by the provider's code exchange (wire shape of `jscode2session`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderIdentity {
    /// openid
    #[serde(rename = "openid", default)]
    pub external_id: String,
    /// session_key
    #[serde(rename = "session_key", default)]
    pub session_secret: String,
    /// 微信错误码（0 表示成功）
    #[serde(rename = "errcode", default)]
    pub error_code: Option<i64>,
    #[serde(rename = "errmsg", default)]
    pub error_message: Option<String>,
}

impl ProviderIdentity {
    /// Successful assertion for the given ids.
    pub fn new(external_id: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            session_secret: session_secret.into(),
            error_code: None,
            error_message: None,
        }
    }

    /// Enforces the assertion invariant: a non-zero error code is a rejection, and a
    /// zero/absent error code must come with a non-empty external id and session secret.
    pub fn ensure_valid(self) -> Result<Self, AuthError> {
        if let Some(code) = self.error_code.filter(|c| *c != 0) {
            let message = self
                .error_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("provider error {}", code));
            return Err(AuthError::ProviderRejected { code, message });
        }
        if self.external_id.is_empty() || self.session_secret.is_empty() {
            return Err(AuthError::ProviderResponseEmpty);
        }
        Ok(self)
    }
}

/// Local user record owned by the identity store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalUser {
    pub id: i64,
    /// openid, unique per user
    pub external_id: String,
    #[serde(skip_serializing)]
    pub session_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    /// Ordered, duplicate-free role list
    pub authorities: Vec<String>,
}

/// Authenticated identity attached to a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    pub name: String,
    pub authorities: BTreeSet<String>,
}

impl AuthenticatedPrincipal {
    pub fn new<I, S>(name: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

impl From<&LocalUser> for AuthenticatedPrincipal {
    fn from(user: &LocalUser) -> Self {
        Self::new(user.external_id.clone(), user.authorities.iter().cloned())
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// one-time code from `wx.login()`
    #[serde(default)]
    pub code: String,
}

/// Parses a comma-separated authority column, keeping first-seen order and dropping blanks/duplicates.
pub fn parse_authorities(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for role in raw.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        if !out.iter().any(|r| r == role) {
            out.push(role.to_string());
        }
    }
    out
}

pub fn join_authorities(authorities: &[String]) -> String {
    authorities.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity_deserialization() {
        let ok: ProviderIdentity =
            serde_json::from_str(r#"{"openid":"wx-1","session_key":"sk-1"}"#).unwrap();
        assert_eq!(ok, ProviderIdentity::new("wx-1", "sk-1"));

        let rejected: ProviderIdentity =
            serde_json::from_str(r#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap();
        assert_eq!(rejected.error_code, Some(40029));
        assert!(rejected.external_id.is_empty());
    }

    #[test]
    fn test_ensure_valid() {
        let ok = ProviderIdentity { error_code: Some(0), ..ProviderIdentity::new("wx-1", "sk-1") };
        assert!(ok.ensure_valid().is_ok());

        let rejected = ProviderIdentity {
            error_code: Some(40029),
            error_message: Some("invalid code".into()),
            ..Default::default()
        };
        match rejected.ensure_valid() {
            Err(AuthError::ProviderRejected { code, message }) => {
                assert_eq!(code, 40029);
                assert_eq!(message, "invalid code");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let missing_secret = ProviderIdentity::new("wx-1", "");
        assert!(matches!(missing_secret.ensure_valid(), Err(AuthError::ProviderResponseEmpty)));
    }

    #[test]
    fn test_parse_authorities() {
        assert_eq!(parse_authorities("USER"), vec!["USER"]);
        assert_eq!(parse_authorities("USER, ADMIN,,USER"), vec!["USER", "ADMIN"]);
        assert!(parse_authorities("").is_empty());
        assert_eq!(join_authorities(&parse_authorities("USER,ADMIN")), "USER,ADMIN");
    }

    #[test]
    fn test_local_user_serialization_hides_session_secret() {
        let user = LocalUser {
            id: 1,
            external_id: "wx-1".into(),
            session_secret: "sk-1".into(),
            display_name: None,
            avatar_ref: None,
            authorities: vec![DEFAULT_AUTHORITY.to_string()],
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("wx-1"));
        assert!(!json.contains("sk-1"));

        let principal = AuthenticatedPrincipal::from(&user);
        assert_eq!(principal.name, "wx-1");
        assert!(principal.has_authority("USER"));
    }
}
