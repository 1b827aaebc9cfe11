//! HTTP surface: handlers and the route table.

pub mod ai;
pub mod applications;
pub mod auth;
pub mod extract;
pub mod misc;
pub mod routes;

pub use extract::ApiJson;
pub use routes::router;
