//! Remote data source: every access function becomes one (or, for the
//! composite create, several) HTTP calls against the backend

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{DataMode, DataSource};
use crate::errors::{AppError, ErrorResponse, Resource, Result};
use crate::metrics;
use crate::models::{
    Comment, Conversation, KnowledgeBase, KnowledgeBaseDraft, Message, NewKnowledgeBase,
    NewMessage, NewPaper, PageRequest, PageResponse, Paper, Post, PostFilter, User,
    CURRENT_USER_ID,
};

/// Access functions backed by the HTTP API
#[derive(Clone)]
pub struct RemoteDataSource {
    client: reqwest::Client,
    base_url: Url,
}

/// Which entity a path addresses, for `NotFound` reporting
fn resource_for(segments: &[&str]) -> Resource {
    match segments {
        ["users", ..] | ["messages", ..] => Resource::User,
        ["knowledge-bases", ..] => Resource::KnowledgeBase,
        ["papers", ..] => Resource::Paper,
        ["posts", "comments", ..] => Resource::Comment,
        ["posts", ..] => Resource::Post,
        _ => Resource::Other,
    }
}

/// Map a non-success response onto the error taxonomy, keeping the
/// backend's message as-is
fn error_from_response(segments: &[&str], status: StatusCode, body: &str) -> AppError {
    let envelope = serde_json::from_str::<ErrorResponse>(body).ok();
    let backend_message = match &envelope {
        Some(envelope) => Some(envelope.error.message.clone()),
        None if body.trim().is_empty() => None,
        None => Some(body.to_string()),
    };
    let message = backend_message.clone().unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound {
            resource: resource_for(segments),
            id: segments
                .iter()
                .rev()
                .find(|s| s.parse::<i64>().is_ok())
                .or(segments.last())
                .copied()
                .unwrap_or_default()
                .to_string(),
            message: backend_message,
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation {
            message,
            field: envelope.and_then(|e| e.error.field),
        },
        _ => AppError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

impl RemoteDataSource {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| AppError::Configuration {
            message: format!("Invalid API base URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration {
                message: format!("API base URL '{}' cannot carry paths", base_url),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.url(segments))
    }

    /// Send and return the raw body of a successful response
    async fn execute(&self, segments: &[&str], request: RequestBuilder) -> Result<String> {
        let endpoint = segments.first().copied().unwrap_or("/");
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_remote_call(endpoint, None, start.elapsed().as_secs_f64());
                warn!(endpoint, error = %e, "Backend unreachable");
                return Err(e.into());
            }
        };

        let status = response.status();
        metrics::record_remote_call(endpoint, Some(status.as_u16()), start.elapsed().as_secs_f64());
        let body = response.text().await?;

        if status.is_success() {
            debug!(endpoint, status = status.as_u16(), "Backend call succeeded");
            Ok(body)
        } else {
            let err = error_from_response(segments, status, &body);
            debug!(endpoint, status = status.as_u16(), error = %err, "Backend call failed");
            Err(err)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, segments: &[&str], request: RequestBuilder) -> Result<T> {
        let body = self.execute(segments, request).await?;
        serde_json::from_str(&body).map_err(Into::into)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.send_json(segments, self.request(Method::GET, segments)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> Result<T> {
        self.send_json(segments, self.request(Method::POST, segments).json(body))
            .await
    }

    async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.execute(segments, self.request(Method::DELETE, segments))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl DataSource for RemoteDataSource {
    fn mode(&self) -> DataMode {
        DataMode::Remote
    }

    async fn get_current_user(&self) -> Result<User> {
        self.get(&["users", "me"]).await
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        self.get(&["users", &user_id.to_string()]).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.get(&["users", "username", username]).await
    }

    async fn get_following_list(&self) -> Result<Vec<User>> {
        self.get(&["users", "following"]).await
    }

    async fn follow_user(&self, user_id: i64) -> Result<bool> {
        self.post(&["users", "follow", &user_id.to_string()], &serde_json::json!({}))
            .await
    }

    async fn unfollow_user(&self, user_id: i64) -> Result<bool> {
        self.post(&["users", "unfollow", &user_id.to_string()], &serde_json::json!({}))
            .await
    }

    async fn is_following(&self, user_id: i64) -> Result<bool> {
        self.get(&["users", "is-following", &user_id.to_string()]).await
    }

    async fn get_user_knowledge_bases(&self, user_id: i64) -> Result<Vec<KnowledgeBase>> {
        self.get(&["knowledge-bases", "user", &user_id.to_string()]).await
    }

    async fn get_user_knowledge_bases_by_username(&self, username: &str) -> Result<Vec<KnowledgeBase>> {
        self.get(&["knowledge-bases", "username", username]).await
    }

    async fn get_knowledge_base(&self, kb_id: i64) -> Result<Option<KnowledgeBase>> {
        match self.get(&["knowledge-bases", &kb_id.to_string()]).await {
            Ok(kb) => Ok(Some(kb)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_all_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>> {
        self.get(&["knowledge-bases"]).await
    }

    async fn add_knowledge_base(&self, kb: NewKnowledgeBase) -> Result<KnowledgeBase> {
        self.post(&["knowledge-bases"], &kb).await
    }

    async fn add_paper_to_knowledge_base(&self, kb_id: i64, paper: NewPaper) -> Result<Paper> {
        self.post(&["knowledge-bases", &kb_id.to_string(), "papers"], &paper)
            .await
    }

    async fn search_papers(&self, query: &str) -> Result<Vec<Paper>> {
        let segments = ["papers", "search"];
        let request = self
            .request(Method::GET, &segments)
            .query(&[("q", query)]);
        self.send_json(&segments, request).await
    }

    async fn get_paper(&self, paper_id: i64) -> Result<Paper> {
        self.get(&["papers", &paper_id.to_string()]).await
    }

    async fn create_knowledge_base_with_papers(&self, draft: KnowledgeBaseDraft) -> Result<KnowledgeBase> {
        let KnowledgeBaseDraft {
            title,
            description,
            papers,
            tags,
        } = draft;

        let created = self
            .add_knowledge_base(NewKnowledgeBase {
                title,
                description,
                user_id: CURRENT_USER_ID,
                papers: Vec::new(),
                tags,
            })
            .await?;

        for paper in papers {
            if let Err(e) = self.add_paper_to_knowledge_base(created.id, paper).await {
                warn!(kb_id = created.id, error = %e, "Attaching papers failed; empty knowledge base remains");
                return Err(e);
            }
        }

        self.get_knowledge_base(created.id)
            .await?
            .ok_or_else(|| AppError::not_found(Resource::KnowledgeBase, created.id))
    }

    async fn get_conversations(&self, _user_id: i64) -> Result<Vec<Conversation>> {
        self.get(&["messages", "conversations"]).await
    }

    async fn get_messages(&self, _user_id: i64, other_id: i64) -> Result<Vec<Message>> {
        self.get(&["messages", &other_id.to_string()]).await
    }

    async fn send_message(&self, _sender_id: i64, receiver_id: i64, content: &str) -> Result<Message> {
        let body = NewMessage {
            receiver_id,
            content: content.to_string(),
        };
        self.post(&["messages"], &body).await
    }

    async fn mark_messages_as_read(&self, _user_id: i64, other_id: i64) -> Result<bool> {
        self.post(&["messages", &other_id.to_string(), "read"], &serde_json::json!({}))
            .await
    }

    async fn list_posts(&self, filter: PostFilter, page: PageRequest) -> Result<PageResponse<Post>> {
        let (segments, approved_only): (&[&str], Option<bool>) = match filter {
            PostFilter::All { approved_only } => (&["posts"], Some(approved_only)),
            PostFilter::Pending => (&["posts", "pending"], None),
            PostFilter::Hidden => (&["posts", "hidden"], None),
        };
        let mut request = self
            .request(Method::GET, segments)
            .query(&[("skip", page.skip), ("limit", page.limit)]);
        if let Some(approved_only) = approved_only {
            request = request.query(&[("approved_only", approved_only)]);
        }
        self.send_json(segments, request).await
    }

    async fn get_post_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.get(&["posts", &post_id.to_string(), "comments"]).await
    }

    async fn approve_post(&self, post_id: i64) -> Result<Post> {
        self.post(&["posts", &post_id.to_string(), "approve"], &serde_json::json!({}))
            .await
    }

    async fn hide_post(&self, post_id: i64) -> Result<Post> {
        self.post(&["posts", &post_id.to_string(), "hide"], &serde_json::json!({}))
            .await
    }

    async fn delete_post(&self, post_id: i64) -> Result<()> {
        self.delete(&["posts", &post_id.to_string()]).await
    }

    async fn approve_comment(&self, comment_id: i64) -> Result<Comment> {
        self.post(&["posts", "comments", &comment_id.to_string(), "approve"], &serde_json::json!({}))
            .await
    }

    async fn hide_comment(&self, comment_id: i64) -> Result<Comment> {
        self.post(&["posts", "comments", &comment_id.to_string(), "hide"], &serde_json::json!({}))
            .await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<()> {
        self.delete(&["posts", "comments", &comment_id.to_string()]).await
    }
}
