//! Access functions
//!
//! [`DataSource`] is the one capability set the binding layer and the
//! gateway program against. Two implementations exist:
//! - [`MockDataSource`] answers from an in-memory [`EntityStore`](crate::store::EntityStore)
//!   with simulated latency
//! - [`RemoteDataSource`] forwards every call to the HTTP backend
//!
//! The variant is chosen once, at startup, by [`create_data_source`].

mod mock;
mod remote;

pub use mock::{MockDataSource, PLACEHOLDER_PAPER_ID_BASE, SEARCH_RESULT_IDS};
pub use remote::RemoteDataSource;

use async_trait::async_trait;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::DataConfig;
use crate::errors::Result;
use crate::models::{
    Comment, Conversation, KnowledgeBase, KnowledgeBaseDraft, Message, NewKnowledgeBase,
    NewPaper, PageRequest, PageResponse, Paper, Post, PostFilter, User,
};
use crate::store::EntityStore;

/// Which implementation is serving the access functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Mock,
    Remote,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Mock => "mock",
            DataMode::Remote => "remote",
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    fn mode(&self) -> DataMode;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    async fn get_current_user(&self) -> Result<User>;

    /// Mock mode never fails: unknown ids get a synthesized placeholder
    async fn get_user(&self, user_id: i64) -> Result<User>;

    async fn get_user_by_username(&self, username: &str) -> Result<User>;

    async fn get_following_list(&self) -> Result<Vec<User>>;

    /// `false` when already following
    async fn follow_user(&self, user_id: i64) -> Result<bool>;

    /// `false` when not following
    async fn unfollow_user(&self, user_id: i64) -> Result<bool>;

    async fn is_following(&self, user_id: i64) -> Result<bool>;

    // ------------------------------------------------------------------
    // Knowledge bases & papers
    // ------------------------------------------------------------------

    async fn get_user_knowledge_bases(&self, user_id: i64) -> Result<Vec<KnowledgeBase>>;

    /// Empty when the username is unknown
    async fn get_user_knowledge_bases_by_username(&self, username: &str) -> Result<Vec<KnowledgeBase>>;

    async fn get_knowledge_base(&self, kb_id: i64) -> Result<Option<KnowledgeBase>>;

    async fn get_all_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>>;

    async fn add_knowledge_base(&self, kb: NewKnowledgeBase) -> Result<KnowledgeBase>;

    async fn add_paper_to_knowledge_base(&self, kb_id: i64, paper: NewPaper) -> Result<Paper>;

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>>;

    async fn get_paper(&self, paper_id: i64) -> Result<Paper>;

    /// Two steps, not atomic: a failure after the first leaves an empty
    /// knowledge base behind
    async fn create_knowledge_base_with_papers(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase>;

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Most recent conversation first
    async fn get_conversations(&self, user_id: i64) -> Result<Vec<Conversation>>;

    /// Oldest message first
    async fn get_messages(&self, user_id: i64, other_id: i64) -> Result<Vec<Message>>;

    async fn send_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Result<Message>;

    /// Marks what `other_id` sent to `user_id` as read
    async fn mark_messages_as_read(&self, user_id: i64, other_id: i64) -> Result<bool>;

    // ------------------------------------------------------------------
    // Moderation
    // ------------------------------------------------------------------

    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> Result<PageResponse<Post>>;

    async fn get_post_comments(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Toggles approval
    async fn approve_post(&self, post_id: i64) -> Result<Post>;

    /// Toggles visibility
    async fn hide_post(&self, post_id: i64) -> Result<Post>;

    async fn delete_post(&self, post_id: i64) -> Result<()>;

    async fn approve_comment(&self, comment_id: i64) -> Result<Comment>;

    async fn hide_comment(&self, comment_id: i64) -> Result<Comment>;

    async fn delete_comment(&self, comment_id: i64) -> Result<()>;
}

/// Create a data source based on configuration
pub fn create_data_source(config: &DataConfig) -> Result<Arc<dyn DataSource>> {
    if config.use_mock_data {
        let clock: Arc<dyn Clock> = if config.simulate_latency {
            Arc::new(SystemClock::new())
        } else {
            Arc::new(SystemClock::without_delays())
        };
        tracing::info!(simulate_latency = config.simulate_latency, "Using mock data source");
        Ok(Arc::new(MockDataSource::new(EntityStore::seeded(), clock)))
    } else {
        tracing::info!(base_url = %config.api_base_url, "Using remote data source");
        Ok(Arc::new(RemoteDataSource::new(
            &config.api_base_url,
            config.request_timeout(),
        )?))
    }
}
