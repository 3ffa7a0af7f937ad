use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::keys;
use crate::cache::{QueryClient, QueryKey, QueryState};
use crate::errors::Result;
use crate::models::{
    Comment, Conversation, KnowledgeBase, Message, PageRequest, PageResponse, Paper, Post,
    PostFilter, User,
};
use crate::source::DataSource;

/// One cached read per access function
#[derive(Clone)]
pub struct Queries {
    source: Arc<dyn DataSource>,
    client: Arc<QueryClient>,
}

impl Queries {
    pub fn new(source: Arc<dyn DataSource>, client: Arc<QueryClient>) -> Self {
        Self { source, client }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    async fn read<T, F, Fut>(&self, key: QueryKey, call: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce(Arc<dyn DataSource>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let source = self.source.clone();
        self.client.fetch(key, move || call(source)).await
    }

    pub async fn current_user(&self) -> QueryState<User> {
        self.read(keys::current_user(), |s| async move { s.get_current_user().await })
            .await
    }

    pub async fn user(&self, user_id: i64) -> QueryState<User> {
        self.read(keys::user(user_id), move |s| async move { s.get_user(user_id).await })
            .await
    }

    /// Disabled while `username` is empty
    pub async fn user_by_username(&self, username: &str) -> QueryState<User> {
        if username.is_empty() {
            return QueryState::idle();
        }
        let username = username.to_string();
        self.read(keys::user_by_username(&username), move |s| async move {
            s.get_user_by_username(&username).await
        })
        .await
    }

    pub async fn following_list(&self) -> QueryState<Vec<User>> {
        self.read(keys::following_list(), |s| async move { s.get_following_list().await })
            .await
    }

    pub async fn is_following(&self, user_id: i64) -> QueryState<bool> {
        self.read(keys::is_following(user_id), move |s| async move {
            s.is_following(user_id).await
        })
        .await
    }

    pub async fn user_knowledge_bases(&self, user_id: i64) -> QueryState<Vec<KnowledgeBase>> {
        self.read(keys::user_knowledge_bases(user_id), move |s| async move {
            s.get_user_knowledge_bases(user_id).await
        })
        .await
    }

    /// Disabled while `username` is empty
    pub async fn user_knowledge_bases_by_username(&self, username: &str) -> QueryState<Vec<KnowledgeBase>> {
        if username.is_empty() {
            return QueryState::idle();
        }
        let username = username.to_string();
        self.read(keys::user_knowledge_bases_by_username(&username), move |s| async move {
            s.get_user_knowledge_bases_by_username(&username).await
        })
        .await
    }

    /// `Success(None)` when the knowledge base does not exist
    pub async fn knowledge_base(&self, kb_id: i64) -> QueryState<Option<KnowledgeBase>> {
        self.read(keys::knowledge_base(kb_id), move |s| async move {
            s.get_knowledge_base(kb_id).await
        })
        .await
    }

    pub async fn all_knowledge_bases(&self) -> QueryState<Vec<KnowledgeBase>> {
        self.read(keys::all_knowledge_bases(), |s| async move {
            s.get_all_knowledge_bases().await
        })
        .await
    }

    /// Disabled for blank queries
    pub async fn search_papers(&self, query: &str) -> QueryState<Vec<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            return QueryState::idle();
        }
        let query = query.to_string();
        self.read(keys::search_papers(&query), move |s| async move {
            s.search_papers(&query).await
        })
        .await
    }

    pub async fn paper(&self, paper_id: i64) -> QueryState<Paper> {
        self.read(keys::paper(paper_id), move |s| async move { s.get_paper(paper_id).await })
            .await
    }

    pub async fn conversations(&self, user_id: i64) -> QueryState<Vec<Conversation>> {
        self.read(keys::conversations(user_id), move |s| async move {
            s.get_conversations(user_id).await
        })
        .await
    }

    pub async fn messages(&self, user_id: i64, other_id: i64) -> QueryState<Vec<Message>> {
        self.read(keys::messages(user_id, other_id), move |s| async move {
            s.get_messages(user_id, other_id).await
        })
        .await
    }

    pub async fn posts(&self, filter: PostFilter, page: PageRequest) -> QueryState<PageResponse<Post>> {
        self.read(keys::posts(filter, page), move |s| async move {
            s.list_posts(filter, page).await
        })
        .await
    }

    pub async fn post_comments(&self, post_id: i64) -> QueryState<Vec<Comment>> {
        self.read(keys::post_comments(post_id), move |s| async move {
            s.get_post_comments(post_id).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryStatus;
    use crate::clock::ManualClock;
    use crate::source::MockDataSource;
    use crate::store::EntityStore;
    use chrono::{TimeZone, Utc};

    fn queries() -> (Queries, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()));
        let source = Arc::new(MockDataSource::new(EntityStore::seeded(), clock.clone()));
        (Queries::new(source, Arc::new(QueryClient::default())), clock)
    }

    #[tokio::test]
    async fn test_second_search_is_served_from_cache() {
        let (q, clock) = queries();

        let first = q.search_papers("diffusion").await;
        assert_eq!(first.status, QueryStatus::Success);
        let slept = clock.total_slept();

        let second = q.search_papers("  diffusion ").await;
        assert_eq!(second.data, first.data);
        assert_eq!(clock.total_slept(), slept);
    }

    #[tokio::test]
    async fn test_user_by_username_resolves_digits() {
        let (q, _) = queries();
        let user = q.user_by_username("someone-3").await.data.unwrap();
        assert_eq!(user.id, 3);
    }

    #[tokio::test]
    async fn test_missing_knowledge_base_is_success_none() {
        let (q, _) = queries();
        let state = q.knowledge_base(999).await;
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.data, Some(None));
    }

    #[tokio::test]
    async fn test_pending_posts_page() {
        let (q, _) = queries();
        let page = q.posts(PostFilter::Pending, PageRequest::default()).await.data.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|p| p.is_pending()));
    }
}
