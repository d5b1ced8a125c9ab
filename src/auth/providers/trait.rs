//! 身份提供商trait定义

use async_trait::async_trait;
use crate::auth::{types::ProviderIdentity, errors::AuthError};

/// Exchanges a one-time login code for the provider's identity assertion.
///
/// Single attempt, no retries. Implementations surface transport failures (timeouts
/// included) as `ProviderUnavailable`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 提供商名称
    fn name(&self) -> &str;

    async fn exchange(&self, code: &str) -> Result<ProviderIdentity, AuthError>;
}
