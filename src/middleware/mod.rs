pub mod admin;
pub mod auth;

pub use admin::back_office_middleware;
pub use auth::auth_middleware;
