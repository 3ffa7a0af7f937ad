//! Papertok Common Library
//!
//! Client data-access layer shared by the gateway and any other consumer:
//! - Domain models (users, knowledge bases, papers, messages, moderation)
//! - In-memory entity store with seed data
//! - Access functions behind one `DataSource` trait (mock or remote)
//! - Query cache and the query/mutation bindings with invalidation rules
//! - Error types, configuration and metrics

pub mod bindings;
pub mod cache;
pub mod clock;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use bindings::{Bindings, MutationHandles, Mutations, Queries};
pub use cache::{MutationState, MutationStatus, QueryClient, QueryKey, QueryState, QueryStatus};
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use source::{create_data_source, DataMode, DataSource, MockDataSource, RemoteDataSource};
pub use store::EntityStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
