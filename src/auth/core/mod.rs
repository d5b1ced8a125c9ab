//! 核心业务逻辑层

pub mod clock;
pub mod login_service;
pub mod token_service;

// 重新导出
pub use clock::{Clock, FixedClock, SystemClock};
pub use login_service::LoginService;
pub use token_service::TokenService;
