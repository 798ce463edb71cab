//! Authentication module
//!
//! Provides JWT session tokens, argon2 password hashing and the session
//! cookie used by browser clients.

pub mod cookie;
mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService};
pub use middleware::AuthUser;
pub use password::PasswordService;
