//! Community moderation: posts, comments and paged listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub author: Author,
    pub likes: u64,
    pub views: u64,
    pub comments_count: u64,
    pub is_approved: bool,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_pending(&self) -> bool {
        !self.is_approved && !self.is_hidden
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: Author,
    pub post_id: i64,
    pub is_approved: bool,
    pub is_hidden: bool,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
}

/// Which slice of the post collection a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All { approved_only: bool },
    Pending,
    Hidden,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All { approved_only } => !approved_only || post.is_approved,
            PostFilter::Pending => post.is_pending(),
            PostFilter::Hidden => post.is_hidden,
        }
    }
}

/// Offset pagination as sent by the moderation page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// 1-based page number
    pub fn page(page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        Self {
            skip: page.saturating_sub(1) * per_page,
            limit: per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Cut one page out of an already filtered, ordered collection
    pub fn paginate(all: Vec<T>, request: PageRequest) -> Self {
        let per_page = request.limit.max(1);
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.skip as usize)
            .take(per_page as usize)
            .collect();

        Self {
            items,
            total,
            page: request.skip / per_page + 1,
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let page = PageResponse::paginate((1..=25).collect::<Vec<_>>(), PageRequest::page(2, 10));
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 10);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_paginate_past_end_and_empty() {
        let page = PageResponse::paginate(vec![1, 2, 3], PageRequest { skip: 10, limit: 10 });
        assert!(page.items.is_empty());
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 1);

        let empty = PageResponse::<i32>::paginate(vec![], PageRequest::default());
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page, 1);
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let page = PageResponse::paginate(vec![1, 2, 3], PageRequest { skip: 0, limit: 0 });
        assert_eq!(page.per_page, 1);
        assert_eq!(page.items, vec![1]);
        assert_eq!(page.total_pages, 3);
    }
}
