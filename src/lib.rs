//! BrightPath backend - job application tracking API
//! Mission: Accounts, JWT sessions, application CRUD, and AI writing helpers

pub mod ai;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod state;
pub mod store;

pub use api::router;
pub use config::AppConfig;
pub use middleware::RateLimiters;
pub use state::AppState;
