//! 认证模块
//!
//! 提供 JWT 会话 Token、密码哈希、重置 Token 和会话 Cookie 处理

mod cookies;
mod jwt;
mod password;
mod reset_token;

pub use cookies::{clear_session_cookie, is_secure_request, session_cookie, session_token_from_cookie};
pub use jwt::{Claims, JwtConfig, JwtManager};
pub use password::{hash_password, verify_password};
pub use reset_token::{generate_reset_token, hash_reset_token};
