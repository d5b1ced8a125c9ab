//! 身份提供商插件层

pub mod r#trait;
pub mod wechat;

// 重新导出
pub use r#trait::IdentityProvider;
pub use wechat::WeChatProvider;
