//! 认证模块 - JWT 验证与请求提取
//!
//! # 模块结构
//!
//! - [`JwtService`] - 令牌生成与验证
//! - [`require_auth`] - Axum 认证中间件
//! - [`CurrentUser`] - 已认证的请求主体

pub mod extractor;
pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
