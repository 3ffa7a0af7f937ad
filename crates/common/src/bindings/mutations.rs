use std::future::Future;
use std::sync::Arc;

use super::invalidation::{invalidations_for, MutationKind};
use crate::cache::{Mutation, MutationState, QueryClient};
use crate::errors::Result;
use crate::models::{
    Comment, KnowledgeBase, KnowledgeBaseDraft, Message, NewKnowledgeBase, NewPaper, Paper, Post,
};
use crate::source::DataSource;

/// Long-lived state of every write, pollable while a call is pending
pub struct MutationHandles {
    pub follow_user: Mutation<bool>,
    pub unfollow_user: Mutation<bool>,
    pub add_knowledge_base: Mutation<KnowledgeBase>,
    pub add_paper_to_knowledge_base: Mutation<Paper>,
    pub create_knowledge_base_with_papers: Mutation<KnowledgeBase>,
    pub send_message: Mutation<Message>,
    pub mark_messages_as_read: Mutation<bool>,
    pub approve_post: Mutation<Post>,
    pub hide_post: Mutation<Post>,
    pub delete_post: Mutation<()>,
    pub approve_comment: Mutation<Comment>,
    pub hide_comment: Mutation<Comment>,
    pub delete_comment: Mutation<()>,
}

impl Default for MutationHandles {
    fn default() -> Self {
        Self {
            follow_user: Mutation::new("followUser"),
            unfollow_user: Mutation::new("unfollowUser"),
            add_knowledge_base: Mutation::new("addKnowledgeBase"),
            add_paper_to_knowledge_base: Mutation::new("addPaperToKnowledgeBase"),
            create_knowledge_base_with_papers: Mutation::new("createKnowledgeBaseWithPapers"),
            send_message: Mutation::new("sendMessage"),
            mark_messages_as_read: Mutation::new("markMessagesAsRead"),
            approve_post: Mutation::new("approvePost"),
            hide_post: Mutation::new("hidePost"),
            delete_post: Mutation::new("deletePost"),
            approve_comment: Mutation::new("approveComment"),
            hide_comment: Mutation::new("hideComment"),
            delete_comment: Mutation::new("deleteComment"),
        }
    }
}

/// One write per mutating access function
///
/// Clones share the same [`MutationHandles`], so any clone can watch a
/// write started through another.
#[derive(Clone)]
pub struct Mutations {
    source: Arc<dyn DataSource>,
    client: Arc<QueryClient>,
    handles: Arc<MutationHandles>,
}

impl Mutations {
    pub fn new(source: Arc<dyn DataSource>, client: Arc<QueryClient>) -> Self {
        Self {
            source,
            client,
            handles: Arc::new(MutationHandles::default()),
        }
    }

    /// Per-operation state, e.g. `handles().follow_user.state()`
    pub fn handles(&self) -> &MutationHandles {
        &self.handles
    }

    async fn write<T, Fut, K>(&self, mutation: &Mutation<T>, call: Fut, kind: K) -> MutationState<T>
    where
        T: Clone,
        Fut: Future<Output = Result<T>>,
        K: FnOnce(&T) -> MutationKind,
    {
        mutation
            .run(&self.client, call, |data| invalidations_for(&kind(data)))
            .await
    }

    /// `Success(false)` when already following
    pub async fn follow_user(&self, user_id: i64) -> MutationState<bool> {
        self.write(&self.handles.follow_user, self.source.follow_user(user_id), |_| {
            MutationKind::FollowUser { user_id }
        })
        .await
    }

    pub async fn unfollow_user(&self, user_id: i64) -> MutationState<bool> {
        self.write(&self.handles.unfollow_user, self.source.unfollow_user(user_id), |_| {
            MutationKind::UnfollowUser { user_id }
        })
        .await
    }

    pub async fn add_knowledge_base(&self, kb: NewKnowledgeBase) -> MutationState<KnowledgeBase> {
        self.write(&self.handles.add_knowledge_base, self.source.add_knowledge_base(kb), |created| {
            MutationKind::AddKnowledgeBase {
                user_id: created.user_id,
                kb_id: created.id,
            }
        })
        .await
    }

    pub async fn add_paper_to_knowledge_base(&self, kb_id: i64, paper: NewPaper) -> MutationState<Paper> {
        self.write(
            &self.handles.add_paper_to_knowledge_base,
            self.source.add_paper_to_knowledge_base(kb_id, paper),
            |added| MutationKind::AddPaperToKnowledgeBase {
                kb_id,
                paper_id: added.id,
            },
        )
        .await
    }

    pub async fn create_knowledge_base_with_papers(&self, draft: KnowledgeBaseDraft) -> MutationState<KnowledgeBase> {
        self.write(
            &self.handles.create_knowledge_base_with_papers,
            self.source.create_knowledge_base_with_papers(draft),
            |created| MutationKind::CreateKnowledgeBaseWithPapers {
                user_id: created.user_id,
                kb_id: created.id,
            },
        )
        .await
    }

    pub async fn send_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> MutationState<Message> {
        self.write(
            &self.handles.send_message,
            self.source.send_message(sender_id, receiver_id, content),
            |_| MutationKind::SendMessage {
                sender_id,
                receiver_id,
            },
        )
        .await
    }

    pub async fn mark_messages_as_read(&self, user_id: i64, other_id: i64) -> MutationState<bool> {
        self.write(
            &self.handles.mark_messages_as_read,
            self.source.mark_messages_as_read(user_id, other_id),
            |_| MutationKind::MarkMessagesAsRead { user_id, other_id },
        )
        .await
    }

    pub async fn approve_post(&self, post_id: i64) -> MutationState<Post> {
        self.write(&self.handles.approve_post, self.source.approve_post(post_id), |_| {
            MutationKind::ApprovePost { post_id }
        })
        .await
    }

    pub async fn hide_post(&self, post_id: i64) -> MutationState<Post> {
        self.write(&self.handles.hide_post, self.source.hide_post(post_id), |_| {
            MutationKind::HidePost { post_id }
        })
        .await
    }

    pub async fn delete_post(&self, post_id: i64) -> MutationState<()> {
        self.write(&self.handles.delete_post, self.source.delete_post(post_id), |_| {
            MutationKind::DeletePost { post_id }
        })
        .await
    }

    pub async fn approve_comment(&self, comment_id: i64) -> MutationState<Comment> {
        self.write(&self.handles.approve_comment, self.source.approve_comment(comment_id), |c: &Comment| {
            MutationKind::ApproveComment { post_id: c.post_id }
        })
        .await
    }

    pub async fn hide_comment(&self, comment_id: i64) -> MutationState<Comment> {
        self.write(&self.handles.hide_comment, self.source.hide_comment(comment_id), |c: &Comment| {
            MutationKind::HideComment { post_id: c.post_id }
        })
        .await
    }

    pub async fn delete_comment(&self, comment_id: i64) -> MutationState<()> {
        self.write(&self.handles.delete_comment, self.source.delete_comment(comment_id), |_| {
            MutationKind::DeleteComment
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::Queries;
    use crate::cache::MutationStatus;
    use crate::clock::ManualClock;
    use crate::models::{PageRequest, PostFilter, CURRENT_USER_ID};
    use crate::source::MockDataSource;
    use crate::store::EntityStore;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Queries, Mutations) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()));
        let source: Arc<dyn DataSource> = Arc::new(MockDataSource::new(EntityStore::seeded(), clock));
        let client = Arc::new(QueryClient::default());
        (
            Queries::new(source.clone(), client.clone()),
            Mutations::new(source, client),
        )
    }

    #[tokio::test]
    async fn test_add_knowledge_base_refreshes_owner_listing() {
        let (q, m) = setup();
        let before = q.user_knowledge_bases(CURRENT_USER_ID).await.data.unwrap();
        let all = q.all_knowledge_bases().await.data.unwrap();

        let created = m
            .add_knowledge_base(NewKnowledgeBase {
                title: "Robotics".into(),
                description: "Manipulation papers".into(),
                user_id: CURRENT_USER_ID,
                papers: vec![],
                tags: vec!["robotics".into()],
            })
            .await
            .data
            .unwrap();

        let after = q.user_knowledge_bases(CURRENT_USER_ID).await.data.unwrap();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last().unwrap().id, created.id);
        assert_eq!(q.all_knowledge_bases().await.data.unwrap().len(), all.len() + 1);
    }

    #[tokio::test]
    async fn test_create_with_papers_shows_up_by_username() {
        let (q, m) = setup();
        let before = q.user_knowledge_bases_by_username("当前用户").await.data.unwrap();

        let created = m
            .create_knowledge_base_with_papers(KnowledgeBaseDraft {
                title: "Agents".into(),
                description: String::new(),
                papers: vec![NewPaper {
                    title: "ReAct".into(),
                    authors: vec![],
                    abstract_text: String::new(),
                    publish_date: "2022".into(),
                    doi: None,
                    url: None,
                }],
                tags: vec![],
            })
            .await;
        assert!(created.is_success());

        let after = q.user_knowledge_bases_by_username("当前用户").await.data.unwrap();
        assert_eq!(after.len(), before.len() + 1);
    }

    #[tokio::test]
    async fn test_moderation_refreshes_listings() {
        let (q, m) = setup();
        let page = PageRequest::default();
        let pending = q.posts(PostFilter::Pending, page).await.data.unwrap();
        assert_eq!(pending.total, 2);

        assert!(m.approve_post(2).await.is_success());
        let pending = q.posts(PostFilter::Pending, page).await.data.unwrap();
        assert_eq!(pending.total, 1);

        let comments = q.post_comments(4).await.data.unwrap();
        assert!(m.delete_comment(comments[0].id).await.is_success());
        assert_eq!(q.post_comments(4).await.data.unwrap().len(), comments.len() - 1);
    }

    #[tokio::test]
    async fn test_pending_write_is_visible_through_handles() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()));
        let mock = MockDataSource::new(EntityStore::seeded(), clock);
        let store = mock.store();
        let m = Mutations::new(Arc::new(mock), Arc::new(QueryClient::default()));
        assert_eq!(m.handles().follow_user.state().status, MutationStatus::Idle);

        // Holding the store lock parks the write inside the data source
        let guard = store.write().await;
        let writer = m.clone();
        let task = tokio::spawn(async move { writer.follow_user(4).await });
        for _ in 0..100 {
            if m.handles().follow_user.state().status != MutationStatus::Idle {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(m.handles().follow_user.state().status, MutationStatus::Pending);
        assert_eq!(m.handles().unfollow_user.state().status, MutationStatus::Idle);

        drop(guard);
        let settled = task.await.unwrap();
        assert!(settled.is_success());
        let observed = m.handles().follow_user.state();
        assert_eq!(observed.status, MutationStatus::Success);
        assert_eq!(observed.data, Some(true));
    }

    #[tokio::test]
    async fn test_mark_read_clears_unread_count() {
        let (q, m) = setup();
        let inbox = q.conversations(CURRENT_USER_ID).await.data.unwrap();
        assert!(inbox.iter().any(|c| c.unread_count > 0));

        assert!(m.mark_messages_as_read(CURRENT_USER_ID, 2).await.is_success());
        let inbox = q.conversations(CURRENT_USER_ID).await.data.unwrap();
        assert!(inbox.iter().all(|c| c.unread_count == 0));
    }
}
