//! Authentication Module
//! Mission: JWT issuance/verification and policy-driven route protection

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::{extract_bearer, TokenCodec, TokenError};
pub use middleware::{auth_gate, AccessPolicy, Gate};
pub use models::{Identity, Role};
