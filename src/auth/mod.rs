//! 微信小程序user认证模块
//!
//! ## 架构设计
//!
//! ```text
//! auth/
//! ├── types.rs          # 类型定义
//! ├── errors.rs         # error类型
//! ├── config.rs         # 配置管理
//! ├── service.rs        # 认证服务（门面）
//! ├── gate.rs           # 请求认证闸门（axum middleware + extractors）
//! ├── core/             # 核心业务逻辑层
//! │   ├── login_service.rs
//! │   ├── token_service.rs
//! │   └── clock.rs
//! ├── providers/        # 身份提供商插件层
//! │   ├── trait.rs
//! │   └── wechat.rs
//! ├── storage/          # 存储抽象层
//! │   ├── trait.rs
//! │   ├── memory.rs
//! │   └── sqlite.rs
//! └── api/              # API接口层
//!     ├── routes.rs
//!     └── handlers.rs
//! ```
//!
//! Login: code → provider → store (create on first login) → token.
//! Every later request: bearer token → gate → principal in request extensions.

pub mod types;
pub mod errors;
pub mod config;
pub mod service;
pub mod core;
pub mod gate;
pub mod providers;
pub mod storage;
pub mod api;

// 重新导出常用类型和函数
pub use types::{AuthenticatedPrincipal, LocalUser, LoginRequest, ProviderIdentity};
pub use errors::AuthError;
pub use config::AuthConfig;
pub use service::AuthService;
pub use api::create_auth_routes;
pub use storage::{UserStorage, MemoryStorage, SqliteStorage};
