//! 服务器配置常量

use std::time::Duration;

/// 并发连接限制
pub const MAX_CONCURRENCY: usize = 256;

/// CORS最大缓存时间
pub const CORS_MAX_AGE: Duration = Duration::from_secs(3600);
