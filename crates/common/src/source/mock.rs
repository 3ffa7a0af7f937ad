//! Mock data source over the in-memory entity store

use async_trait::async_trait;
use rand::Rng;
use regex_lite::Regex;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{DataMode, DataSource};
use crate::clock::{latency, Clock};
use crate::errors::{AppError, Resource, Result};
use crate::models::{
    Comment, Conversation, KnowledgeBase, KnowledgeBaseDraft, Message, NewKnowledgeBase,
    NewMessage, NewPaper, PageRequest, PageResponse, Paper, Post, PostFilter, User,
    CURRENT_USER_ID,
};
use crate::store::EntityStore;

/// Papers attached by the composite create get `1000 + index`
pub const PLACEHOLDER_PAPER_ID_BASE: i64 = 1000;

/// Fixed ids of the synthetic search hits
pub const SEARCH_RESULT_IDS: [i64; 3] = [9001, 9002, 9003];

const UNKNOWN_USERNAME: &str = "未知用户";

fn non_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").expect("static pattern"))
}

/// Numeric id hidden in a username such as `用户42`
fn id_from_username(username: &str) -> Option<i64> {
    non_digits()
        .replace_all(username, "")
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}

fn search_results(query: &str) -> Vec<Paper> {
    let [first, second, third] = SEARCH_RESULT_IDS;
    vec![
        Paper {
            id: first,
            title: format!("{}: A Survey", query),
            authors: vec!["Zhang Wei".into(), "Li Na".into()],
            abstract_text: format!("A broad survey of recent research on {}.", query),
            publish_date: "2023-09-15".into(),
            doi: Some("10.1234/search-survey-2023".into()),
            url: Some(format!("https://example.com/search/{}", first)),
        },
        Paper {
            id: second,
            title: format!("Advances in {}", query),
            authors: vec!["Wang Fang".into()],
            abstract_text: format!("New methods and open problems in {}.", query),
            publish_date: "2023-11-02".into(),
            doi: Some("10.1234/search-advances-2023".into()),
            url: Some(format!("https://example.com/search/{}", second)),
        },
        Paper {
            id: third,
            title: format!("{} in Practice", query),
            authors: vec!["Chen Jie".into(), "Liu Yang".into(), "Zhao Min".into()],
            abstract_text: format!("Case studies applying {} to real-world systems.", query),
            publish_date: "2024-01-20".into(),
            doi: None,
            url: None,
        },
    ]
}

/// Access functions answered from an [`EntityStore`]
#[derive(Clone)]
pub struct MockDataSource {
    store: Arc<RwLock<EntityStore>>,
    clock: Arc<dyn Clock>,
}

impl MockDataSource {
    pub fn new(store: EntityStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            clock,
        }
    }

    /// Shared handle on the underlying store
    pub fn store(&self) -> Arc<RwLock<EntityStore>> {
        self.store.clone()
    }

    /// Copy of the store's current state
    pub async fn snapshot(&self) -> EntityStore {
        self.store.read().await.clone()
    }

    fn synthesize_for_username(username: &str) -> User {
        let mut rng = rand::thread_rng();
        let id = 9000 + rng.gen_range(0..1000);
        if username.is_empty() {
            let seed: u32 = rng.gen();
            User::placeholder(id, UNKNOWN_USERNAME, seed, &mut rng)
        } else {
            User::placeholder(id, username, username, &mut rng)
        }
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    fn mode(&self) -> DataMode {
        DataMode::Mock
    }

    async fn get_current_user(&self) -> Result<User> {
        Ok(self.store.read().await.current_user().clone())
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        let found = self.store.read().await.find_user(user_id).cloned();
        match found {
            Some(user) => Ok(user),
            None => {
                debug!(user_id, "Unknown user id, synthesizing placeholder");
                Ok(User::placeholder_for_id(user_id, &mut rand::thread_rng()))
            }
        }
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let found = {
            let store = self.store.read().await;
            store.find_user_by_username(username).cloned().or_else(|| {
                id_from_username(username).and_then(|id| store.find_user(id).cloned())
            })
        };
        match found {
            Some(user) => Ok(user),
            None => {
                debug!(username, "Unknown username, synthesizing placeholder");
                Ok(Self::synthesize_for_username(username))
            }
        }
    }

    async fn get_following_list(&self) -> Result<Vec<User>> {
        Ok(self.store.read().await.following_list())
    }

    async fn follow_user(&self, user_id: i64) -> Result<bool> {
        let changed = self.store.write().await.follow(user_id);
        info!(user_id, changed, "Follow user");
        self.clock.sleep(latency::FOLLOW).await;
        Ok(changed)
    }

    async fn unfollow_user(&self, user_id: i64) -> Result<bool> {
        let changed = self.store.write().await.unfollow(user_id);
        info!(user_id, changed, "Unfollow user");
        self.clock.sleep(latency::FOLLOW).await;
        Ok(changed)
    }

    async fn is_following(&self, user_id: i64) -> Result<bool> {
        Ok(self.store.read().await.is_following(user_id))
    }

    async fn get_user_knowledge_bases(&self, user_id: i64) -> Result<Vec<KnowledgeBase>> {
        Ok(self.store.read().await.knowledge_bases_of(user_id))
    }

    async fn get_user_knowledge_bases_by_username(&self, username: &str) -> Result<Vec<KnowledgeBase>> {
        let store = self.store.read().await;
        Ok(store
            .find_user_by_username(username)
            .map(|user| store.knowledge_bases_of(user.id))
            .unwrap_or_default())
    }

    async fn get_knowledge_base(&self, kb_id: i64) -> Result<Option<KnowledgeBase>> {
        Ok(self.store.read().await.knowledge_base(kb_id).cloned())
    }

    async fn get_all_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        Ok(self.store.read().await.knowledge_bases().to_vec())
    }

    async fn add_knowledge_base(&self, kb: NewKnowledgeBase) -> Result<KnowledgeBase> {
        kb.validate()?;
        let today = self.clock.today();
        let created = self.store.write().await.insert_knowledge_base(kb, today);
        info!(kb_id = created.id, user_id = created.user_id, "Knowledge base created");
        self.clock.sleep(latency::ADD_KNOWLEDGE_BASE).await;
        Ok(created)
    }

    async fn add_paper_to_knowledge_base(&self, kb_id: i64, paper: NewPaper) -> Result<Paper> {
        paper.validate()?;
        let today = self.clock.today();
        let result = self.store.write().await.add_paper(kb_id, paper, today);
        self.clock.sleep(latency::ADD_PAPER).await;
        match &result {
            Ok(paper) => info!(kb_id, paper_id = paper.id, "Paper added"),
            Err(e) => warn!(kb_id, error = %e, "Paper not added"),
        }
        result
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.clock.sleep(latency::SEARCH_PAPERS).await;
        Ok(search_results(query))
    }

    async fn get_paper(&self, paper_id: i64) -> Result<Paper> {
        self.store
            .read()
            .await
            .find_paper(paper_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(Resource::Paper, paper_id))
    }

    async fn create_knowledge_base_with_papers(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        draft.validate()?;
        let KnowledgeBaseDraft {
            title,
            description,
            papers,
            tags,
        } = draft;

        // Step 1: the empty knowledge base is committed on its own
        let today = self.clock.today();
        let created = self.store.write().await.insert_knowledge_base(
            NewKnowledgeBase {
                title,
                description,
                user_id: CURRENT_USER_ID,
                papers: Vec::new(),
                tags,
            },
            today,
        );
        debug!(kb_id = created.id, papers = papers.len(), "Knowledge base created, attaching papers");
        self.clock.sleep(latency::CREATE_WITH_PAPERS / 2).await;

        // Step 2: other operations may have run in between
        let today = self.clock.today();
        let result = self.store.write().await.attach_papers(
            created.id,
            papers,
            PLACEHOLDER_PAPER_ID_BASE,
            today,
        );
        self.clock.sleep(latency::CREATE_WITH_PAPERS / 2).await;

        match result {
            Ok(kb) => {
                info!(kb_id = kb.id, papers = kb.papers.len(), "Knowledge base created with papers");
                Ok(kb)
            }
            Err(e) => {
                warn!(kb_id = created.id, error = %e, "Attaching papers failed; empty knowledge base remains");
                Err(e)
            }
        }
    }

    async fn get_conversations(&self, user_id: i64) -> Result<Vec<Conversation>> {
        Ok(self.store.read().await.conversations(user_id))
    }

    async fn get_messages(&self, user_id: i64, other_id: i64) -> Result<Vec<Message>> {
        Ok(self.store.read().await.messages_between(user_id, other_id))
    }

    async fn send_message(&self, sender_id: i64, receiver_id: i64, content: &str) -> Result<Message> {
        let payload = NewMessage {
            receiver_id,
            content: content.to_string(),
        };
        payload.validate()?;
        let now = self.clock.now();
        let message = self
            .store
            .write()
            .await
            .insert_message(sender_id, receiver_id, payload.content, now);
        debug!(message_id = message.id, sender_id, receiver_id, "Message sent");
        Ok(message)
    }

    async fn mark_messages_as_read(&self, user_id: i64, other_id: i64) -> Result<bool> {
        let changed = self.store.write().await.mark_read(user_id, other_id);
        debug!(user_id, other_id, changed, "Messages marked as read");
        Ok(true)
    }

    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> Result<PageResponse<Post>> {
        let posts = self.store.read().await.posts(filter);
        Ok(PageResponse::paginate(posts, page))
    }

    async fn get_post_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.store.read().await.post_comments(post_id)
    }

    async fn approve_post(&self, post_id: i64) -> Result<Post> {
        let post = self.store.write().await.toggle_post_approved(post_id)?;
        info!(post_id, approved = post.is_approved, "Post approval toggled");
        Ok(post)
    }

    async fn hide_post(&self, post_id: i64) -> Result<Post> {
        let post = self.store.write().await.toggle_post_hidden(post_id)?;
        info!(post_id, hidden = post.is_hidden, "Post visibility toggled");
        Ok(post)
    }

    async fn delete_post(&self, post_id: i64) -> Result<()> {
        self.store.write().await.delete_post(post_id)?;
        info!(post_id, "Post deleted");
        Ok(())
    }

    async fn approve_comment(&self, comment_id: i64) -> Result<Comment> {
        let comment = self.store.write().await.toggle_comment_approved(comment_id)?;
        info!(comment_id, approved = comment.is_approved, "Comment approval toggled");
        Ok(comment)
    }

    async fn hide_comment(&self, comment_id: i64) -> Result<Comment> {
        let comment = self.store.write().await.toggle_comment_hidden(comment_id)?;
        info!(comment_id, hidden = comment.is_hidden, "Comment visibility toggled");
        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        self.store.write().await.delete_comment(comment_id)?;
        info!(comment_id, "Comment deleted");
        Ok(())
    }
}
