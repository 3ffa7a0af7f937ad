//! Cache key builders, one per read

use crate::cache::QueryKey;
use crate::models::{PageRequest, PostFilter};

pub fn current_user() -> QueryKey {
    QueryKey::new("currentUser")
}

pub fn user(user_id: i64) -> QueryKey {
    QueryKey::new("user").with(user_id)
}

pub fn user_by_username(username: &str) -> QueryKey {
    QueryKey::new("user").with("byUsername").with(username)
}

pub fn following_list() -> QueryKey {
    QueryKey::new("followingList")
}

pub fn is_following(user_id: i64) -> QueryKey {
    QueryKey::new("isFollowing").with(user_id)
}

pub fn user_knowledge_bases(user_id: i64) -> QueryKey {
    QueryKey::new("userKnowledgeBases").with(user_id)
}

pub fn user_knowledge_bases_by_username(username: &str) -> QueryKey {
    QueryKey::new("userKnowledgeBasesByUsername").with(username)
}

pub fn knowledge_base(kb_id: i64) -> QueryKey {
    QueryKey::new("knowledgeBase").with(kb_id)
}

pub fn all_knowledge_bases() -> QueryKey {
    QueryKey::new("allKnowledgeBases")
}

pub fn search_papers(query: &str) -> QueryKey {
    QueryKey::new("searchPapers").with(query)
}

pub fn paper(paper_id: i64) -> QueryKey {
    QueryKey::new("paper").with(paper_id)
}

pub fn conversations(user_id: i64) -> QueryKey {
    QueryKey::new("conversations").with(user_id)
}

pub fn messages(user_id: i64, other_id: i64) -> QueryKey {
    QueryKey::new("messages").with(user_id).with(other_id)
}

pub fn posts(filter: PostFilter, page: PageRequest) -> QueryKey {
    let slice = match filter {
        PostFilter::All { approved_only: false } => "all",
        PostFilter::All { approved_only: true } => "approved",
        PostFilter::Pending => "pending",
        PostFilter::Hidden => "hidden",
    };
    QueryKey::new("posts").with(slice).with(page.skip).with(page.limit)
}

pub fn post_comments(post_id: i64) -> QueryKey {
    QueryKey::new("postComments").with(post_id)
}
