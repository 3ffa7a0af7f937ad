//! Domain models shared by the entity store, both data sources and the
//! gateway
//!
//! JSON field names follow what the web client consumes: camelCase for the
//! social entities, snake_case for the moderation surface.

mod knowledge_base;
mod message;
mod moderation;
mod user;

pub use knowledge_base::{KnowledgeBase, KnowledgeBaseDraft, NewKnowledgeBase, NewPaper, Paper};
pub use message::{conversation_id, Conversation, Message, NewMessage};
pub use moderation::{Author, Comment, PageRequest, PageResponse, Post, PostFilter, DEFAULT_PAGE_SIZE};
pub use user::{avatar_url, User, CURRENT_USER_ID};
