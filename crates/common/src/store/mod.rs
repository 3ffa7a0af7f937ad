//! In-memory entity store
//!
//! Authoritative collections for mock mode. Every operation here is
//! synchronous and never suspends; callers hold one lock guard for the
//! duration of a call, which makes each mutation atomic to observers.
//! Id assignment is `max(existing, 0) + 1` for every collection.

mod seed;

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use crate::errors::{AppError, Resource, Result};
use crate::models::{
    conversation_id, Comment, Conversation, KnowledgeBase, Message, NewKnowledgeBase, NewPaper,
    Paper, Post, PostFilter, User, CURRENT_USER_ID,
};

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0).max(0) + 1
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    current_user: User,
    users: Vec<User>,
    knowledge_bases: Vec<KnowledgeBase>,
    messages: Vec<Message>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl EntityStore {
    /// Store holding only the current user
    pub fn empty() -> Self {
        Self {
            current_user: seed::current_user(),
            users: Vec::new(),
            knowledge_bases: Vec::new(),
            messages: Vec::new(),
            posts: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Store with the sample dataset
    pub fn seeded() -> Self {
        Self {
            current_user: seed::current_user(),
            users: seed::users(),
            knowledge_bases: seed::knowledge_bases(),
            messages: seed::messages(),
            posts: seed::posts(),
            comments: seed::comments(),
        }
    }

    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn with_knowledge_bases(mut self, knowledge_bases: Vec<KnowledgeBase>) -> Self {
        self.knowledge_bases = knowledge_bases;
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_posts(mut self, posts: Vec<Post>, comments: Vec<Comment>) -> Self {
        self.posts = posts;
        self.comments = comments;
        self
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub fn current_user(&self) -> &User {
        &self.current_user
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn find_user(&self, user_id: i64) -> Option<&User> {
        if user_id == CURRENT_USER_ID {
            return Some(&self.current_user);
        }
        self.users.iter().find(|u| u.id == user_id)
    }

    /// Exact username match
    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        if self.current_user.username == username {
            return Some(&self.current_user);
        }
        self.users.iter().find(|u| u.username == username)
    }

    /// Followed users that exist in the store, in follow order
    pub fn following_list(&self) -> Vec<User> {
        self.current_user
            .following_list
            .iter()
            .filter_map(|id| self.users.iter().find(|u| u.id == *id))
            .cloned()
            .collect()
    }

    pub fn is_following(&self, user_id: i64) -> bool {
        self.current_user.follows(user_id)
    }

    /// Returns false when `user_id` is already followed
    pub fn follow(&mut self, user_id: i64) -> bool {
        if self.current_user.follows(user_id) {
            return false;
        }
        self.current_user.following_list.push(user_id);
        self.current_user.following += 1;
        if let Some(target) = self.users.iter_mut().find(|u| u.id == user_id) {
            target.followers += 1;
        }
        true
    }

    /// Returns false when `user_id` was not followed
    pub fn unfollow(&mut self, user_id: i64) -> bool {
        let Some(index) = self
            .current_user
            .following_list
            .iter()
            .position(|id| *id == user_id)
        else {
            return false;
        };
        self.current_user.following_list.remove(index);
        self.current_user.following = self.current_user.following.saturating_sub(1);
        if let Some(target) = self.users.iter_mut().find(|u| u.id == user_id) {
            target.followers = target.followers.saturating_sub(1);
        }
        true
    }

    // ========================================================================
    // Knowledge bases & papers
    // ========================================================================

    pub fn knowledge_bases(&self) -> &[KnowledgeBase] {
        &self.knowledge_bases
    }

    pub fn knowledge_base(&self, kb_id: i64) -> Option<&KnowledgeBase> {
        self.knowledge_bases.iter().find(|kb| kb.id == kb_id)
    }

    /// Knowledge bases owned by `user_id`, in storage order
    pub fn knowledge_bases_of(&self, user_id: i64) -> Vec<KnowledgeBase> {
        self.knowledge_bases
            .iter()
            .filter(|kb| kb.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn insert_knowledge_base(&mut self, new: NewKnowledgeBase, today: NaiveDate) -> KnowledgeBase {
        let kb = KnowledgeBase {
            id: next_id(self.knowledge_bases.iter().map(|kb| kb.id)),
            title: new.title,
            description: new.description,
            user_id: new.user_id,
            papers: new.papers,
            tags: new.tags,
            stars: 0,
            forks: 0,
            created_at: today,
            updated_at: today,
        };
        self.knowledge_bases.push(kb.clone());
        kb
    }

    pub fn remove_knowledge_base(&mut self, kb_id: i64) -> Option<KnowledgeBase> {
        let index = self.knowledge_bases.iter().position(|kb| kb.id == kb_id)?;
        Some(self.knowledge_bases.remove(index))
    }

    fn knowledge_base_mut(&mut self, kb_id: i64) -> Result<&mut KnowledgeBase> {
        self.knowledge_bases
            .iter_mut()
            .find(|kb| kb.id == kb_id)
            .ok_or_else(|| AppError::not_found(Resource::KnowledgeBase, kb_id))
    }

    /// Append a paper with the next free id and touch `updated_at`
    pub fn add_paper(&mut self, kb_id: i64, paper: NewPaper, today: NaiveDate) -> Result<Paper> {
        let kb = self.knowledge_base_mut(kb_id)?;
        let paper = paper.with_id(kb.next_paper_id());
        kb.papers.push(paper.clone());
        kb.updated_at = today.max(kb.created_at);
        Ok(paper)
    }

    /// Append papers with consecutive ids starting at `first_id`
    pub fn attach_papers(
        &mut self,
        kb_id: i64,
        papers: Vec<NewPaper>,
        first_id: i64,
        today: NaiveDate,
    ) -> Result<KnowledgeBase> {
        let kb = self.knowledge_base_mut(kb_id)?;
        kb.papers.extend(
            papers
                .into_iter()
                .zip(first_id..)
                .map(|(paper, id)| paper.with_id(id)),
        );
        kb.updated_at = today.max(kb.created_at);
        Ok(kb.clone())
    }

    /// First paper with `paper_id`, scanning knowledge bases in storage order
    pub fn find_paper(&self, paper_id: i64) -> Option<&Paper> {
        self.knowledge_bases.iter().find_map(|kb| kb.paper(paper_id))
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Conversations of `user_id`, most recent first
    pub fn conversations(&self, user_id: i64) -> Vec<Conversation> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&Message>> = HashMap::new();

        for msg in self.messages.iter().filter(|m| m.involves(user_id)) {
            let key = conversation_id(user_id, msg.counterpart(user_id));
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(msg);
        }

        let mut conversations: Vec<Conversation> = order
            .into_iter()
            .filter_map(|key| {
                let msgs = groups.remove(&key)?;
                let last = msgs.iter().max_by_key(|m| m.timestamp)?;
                let other = last.counterpart(user_id);
                let unread_count = msgs
                    .iter()
                    .filter(|m| !m.is_read && m.receiver_id == user_id && m.sender_id != user_id)
                    .count();
                Some(Conversation {
                    id: key,
                    participants: [user_id.min(other), user_id.max(other)],
                    last_message: (*last).clone(),
                    unread_count,
                })
            })
            .collect();

        conversations.sort_by(|a, b| b.last_message.timestamp.cmp(&a.last_message.timestamp));
        conversations
    }

    /// Thread between two users, oldest first
    pub fn messages_between(&self, a: i64, b: i64) -> Vec<Message> {
        let mut thread: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        thread.sort_by_key(|m| m.timestamp);
        thread
    }

    pub fn insert_message(
        &mut self,
        sender_id: i64,
        receiver_id: i64,
        content: String,
        now: DateTime<Utc>,
    ) -> Message {
        let message = Message {
            id: next_id(self.messages.iter().map(|m| m.id)),
            sender_id,
            receiver_id,
            content,
            timestamp: now,
            is_read: false,
        };
        self.messages.push(message.clone());
        message
    }

    /// Mark everything `sender_id` sent to `reader_id` as read; returns how
    /// many messages changed
    pub fn mark_read(&mut self, reader_id: i64, sender_id: i64) -> usize {
        let mut changed = 0;
        for msg in self
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == sender_id && m.receiver_id == reader_id && !m.is_read)
        {
            msg.is_read = true;
            changed += 1;
        }
        changed
    }

    // ========================================================================
    // Moderation
    // ========================================================================

    /// Matching posts, newest first
    pub fn posts(&self, filter: PostFilter) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    pub fn post_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        if !self.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::not_found(Resource::Post, post_id));
        }
        Ok(self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    fn post_mut(&mut self, post_id: i64) -> Result<&mut Post> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| AppError::not_found(Resource::Post, post_id))
    }

    fn comment_mut(&mut self, comment_id: i64) -> Result<&mut Comment> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found(Resource::Comment, comment_id))
    }

    pub fn toggle_post_approved(&mut self, post_id: i64) -> Result<Post> {
        let post = self.post_mut(post_id)?;
        post.is_approved = !post.is_approved;
        Ok(post.clone())
    }

    pub fn toggle_post_hidden(&mut self, post_id: i64) -> Result<Post> {
        let post = self.post_mut(post_id)?;
        post.is_hidden = !post.is_hidden;
        Ok(post.clone())
    }

    /// Removes the post together with its comments
    pub fn delete_post(&mut self, post_id: i64) -> Result<()> {
        let index = self
            .posts
            .iter()
            .position(|p| p.id == post_id)
            .ok_or_else(|| AppError::not_found(Resource::Post, post_id))?;
        self.posts.remove(index);
        self.comments.retain(|c| c.post_id != post_id);
        Ok(())
    }

    pub fn toggle_comment_approved(&mut self, comment_id: i64) -> Result<Comment> {
        let comment = self.comment_mut(comment_id)?;
        comment.is_approved = !comment.is_approved;
        Ok(comment.clone())
    }

    pub fn toggle_comment_hidden(&mut self, comment_id: i64) -> Result<Comment> {
        let comment = self.comment_mut(comment_id)?;
        comment.is_hidden = !comment.is_hidden;
        Ok(comment.clone())
    }

    pub fn delete_comment(&mut self, comment_id: i64) -> Result<()> {
        let index = self
            .comments
            .iter()
            .position(|c| c.id == comment_id)
            .ok_or_else(|| AppError::not_found(Resource::Comment, comment_id))?;
        let removed = self.comments.remove(index);
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == removed.post_id) {
            post.comments_count = post.comments_count.saturating_sub(1);
        }
        Ok(())
    }
}
