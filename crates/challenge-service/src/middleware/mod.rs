//! HTTP 中间件

mod admin;
mod auth;
mod security;

pub use admin::require_admin;
pub use auth::{CurrentUser, MaybeUser, auth_middleware};
pub use security::security_headers;
