//! Persistence layer backed by Supabase's PostgREST API.
//!
//! One thin HTTP client, one store per table. Stores are cheap clones that
//! share the client's connection pool.

pub mod applications;
pub mod supabase;
pub mod users;

pub use applications::{
    ApplicationRecord, ApplicationStatus, ApplicationStore, ListOptions, NewApplication,
    SearchOptions, StatusCounts, UserStats,
};
pub use supabase::{StoreError, SupabaseClient};
pub use users::{UserRecord, UserStore, UserWithPassword};
