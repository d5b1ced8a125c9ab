//! Token管理服务
//!
//! HS256 compact JWS carrying `name`, `authorities`, `iat`, `exp`. Verification is
//! stateless: the principal is rebuilt from claims alone, so a user changed or removed
//! in the store keeps a working token until it expires.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::core::clock::{Clock, SystemClock};
use crate::auth::errors::AuthError;
use crate::auth::types::{AuthenticatedPrincipal, LocalUser};

/// Upper bound for token validity (10 years)
pub const MAX_VALIDITY_SECS: u64 = 10 * 365 * 24 * 3600;

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    name: String,
    authorities: Vec<String>,
    /// 签发时间戳
    iat: i64,
    /// 过期时间戳
    exp: i64,
}

/// Token管理服务
pub struct TokenService {
    /// JWT密钥（使用Zeroizing保护内存）
    secret: zeroize::Zeroizing<String>,

    validity: Duration,

    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// 创建新的Token服务
    pub fn new(secret: String, validity_secs: u64) -> Result<Self, AuthError> {
        Self::with_clock(secret, validity_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(
        secret: String,
        validity_secs: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Configuration("token signing key must not be empty".into()));
        }
        if secret.len() < 32 {
            warn!("token signing key is shorter than 32 bytes");
        }
        let validity = Some(validity_secs)
            .filter(|s| (1..=MAX_VALIDITY_SECS).contains(s))
            .and_then(|s| i64::try_from(s).ok())
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AuthError::Configuration("token validity out of range".into()))?;

        Ok(Self {
            secret: zeroize::Zeroizing::new(secret),
            validity,
            clock,
        })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// 为principal签发token
    pub fn issue(&self, principal: &AuthenticatedPrincipal) -> Result<String, AuthError> {
        self.sign(&principal.name, principal.authorities.iter().cloned().collect())
    }

    /// Issues a token for a stored user, keeping the stored authority order.
    pub fn issue_for_user(&self, user: &LocalUser) -> Result<String, AuthError> {
        self.sign(&user.external_id, user.authorities.clone())
    }

    fn sign(&self, name: &str, authorities: Vec<String>) -> Result<String, AuthError> {
        let now = self.clock.now();
        let claims = Claims {
            name: name.to_string(),
            authorities,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.validity)
                .ok_or_else(|| AuthError::InternalError("token expiry out of range".into()))?
                .timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(format!("JWT生成failed: {}", e)))?;

        debug!(exp = claims.exp, "issued access token");
        Ok(token)
    }

    /// validateToken并重建principal
    pub fn verify(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

        // The library checks against the wall clock; the injected clock must agree too.
        if self.clock.now().timestamp() > data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(AuthenticatedPrincipal::new(data.claims.name, data.claims.authorities))
    }
}
