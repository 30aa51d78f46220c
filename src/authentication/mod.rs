mod casbin_middleware;
mod jwt;
mod middleware;
mod password;

pub use casbin_middleware::{load_enforcer, PermissionGuard};
pub use jwt::{Claims, TokenError, TokenKeys};
pub use middleware::*;
pub use password::*;
