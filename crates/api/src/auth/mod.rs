//! Session authentication for Plangate

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, JwtManager};
pub use middleware::{optional_session, resolve_session, SessionSource, SESSION_COOKIE};
