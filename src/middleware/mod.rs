pub mod admin;

pub use admin::{require_admin, ADMIN_TOKEN_HEADER};
