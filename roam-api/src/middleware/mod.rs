pub mod auth;

pub use auth::{admin_auth_middleware, host_auth_middleware, Claims};
