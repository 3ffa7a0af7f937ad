//! Query/mutation bindings
//!
//! The only surface a client should consume. Every read goes through the
//! shared [`QueryClient`] under a key from [`keys`]; every write reports
//! its outcome as a [`MutationState`](crate::cache::MutationState) and,
//! on success, marks the reads listed in [`invalidation`] stale.

pub mod invalidation;
pub mod keys;
mod mutations;
mod queries;

pub use invalidation::{invalidations_for, Entity, MutationKind, QueryKind};
pub use mutations::{MutationHandles, Mutations};
pub use queries::Queries;

use std::sync::Arc;

use crate::cache::QueryClient;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::source::{create_data_source, DataSource};

/// Reads and writes over one data source and one cache
#[derive(Clone)]
pub struct Bindings {
    pub queries: Queries,
    pub mutations: Mutations,
}

impl Bindings {
    pub fn new(source: Arc<dyn DataSource>, client: Arc<QueryClient>) -> Self {
        Self {
            queries: Queries::new(source.clone(), client.clone()),
            mutations: Mutations::new(source, client),
        }
    }

    /// Pick the data source from configuration and start with an empty cache
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let source = create_data_source(&config.data)?;
        let client = Arc::new(QueryClient::new(config.cache.stale_time()));
        Ok(Self::new(source, client))
    }

    pub fn client(&self) -> &QueryClient {
        self.queries.client()
    }
}
