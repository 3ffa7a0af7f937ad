//! Which cached reads each write makes obsolete
//!
//! Reads and writes are both described in terms of the entities they
//! touch, so the table in [`invalidations_for`] can be checked against
//! the dependency graph instead of trusted.

use super::keys;
use crate::cache::QueryKey;

/// Data a read depends on or a write changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// Profile fields and follower/following counters
    User,
    /// The current user's following list
    FollowEdge,
    KnowledgeBase,
    Paper,
    Message,
    Post,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    CurrentUser,
    User,
    UserByUsername,
    FollowingList,
    IsFollowing,
    UserKnowledgeBases,
    UserKnowledgeBasesByUsername,
    KnowledgeBase,
    AllKnowledgeBases,
    SearchPapers,
    Paper,
    Conversations,
    Messages,
    Posts,
    PostComments,
}

impl QueryKind {
    pub const ALL: [QueryKind; 15] = [
        QueryKind::CurrentUser,
        QueryKind::User,
        QueryKind::UserByUsername,
        QueryKind::FollowingList,
        QueryKind::IsFollowing,
        QueryKind::UserKnowledgeBases,
        QueryKind::UserKnowledgeBasesByUsername,
        QueryKind::KnowledgeBase,
        QueryKind::AllKnowledgeBases,
        QueryKind::SearchPapers,
        QueryKind::Paper,
        QueryKind::Conversations,
        QueryKind::Messages,
        QueryKind::Posts,
        QueryKind::PostComments,
    ];

    /// Key prefix shared by every read of this kind
    pub fn family(&self) -> QueryKey {
        match self {
            QueryKind::CurrentUser => keys::current_user(),
            QueryKind::User => QueryKey::new("user"),
            QueryKind::UserByUsername => QueryKey::new("user").with("byUsername"),
            QueryKind::FollowingList => keys::following_list(),
            QueryKind::IsFollowing => QueryKey::new("isFollowing"),
            QueryKind::UserKnowledgeBases => QueryKey::new("userKnowledgeBases"),
            QueryKind::UserKnowledgeBasesByUsername => QueryKey::new("userKnowledgeBasesByUsername"),
            QueryKind::KnowledgeBase => QueryKey::new("knowledgeBase"),
            QueryKind::AllKnowledgeBases => keys::all_knowledge_bases(),
            QueryKind::SearchPapers => QueryKey::new("searchPapers"),
            QueryKind::Paper => QueryKey::new("paper"),
            QueryKind::Conversations => QueryKey::new("conversations"),
            QueryKind::Messages => QueryKey::new("messages"),
            QueryKind::Posts => QueryKey::new("posts"),
            QueryKind::PostComments => QueryKey::new("postComments"),
        }
    }

    pub fn reads(&self) -> &'static [Entity] {
        use Entity::*;
        match self {
            QueryKind::CurrentUser | QueryKind::FollowingList => &[User, FollowEdge],
            QueryKind::User | QueryKind::UserByUsername => &[User],
            QueryKind::IsFollowing => &[FollowEdge],
            QueryKind::UserKnowledgeBases
            | QueryKind::UserKnowledgeBasesByUsername
            | QueryKind::KnowledgeBase
            | QueryKind::AllKnowledgeBases => &[KnowledgeBase, Paper],
            // Search results are synthesized, not read from the store
            QueryKind::SearchPapers => &[],
            QueryKind::Paper => &[Paper],
            QueryKind::Conversations | QueryKind::Messages => &[Message],
            QueryKind::Posts => &[Post],
            QueryKind::PostComments => &[Comment],
        }
    }
}

/// A write together with the ids its invalidations depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    FollowUser { user_id: i64 },
    UnfollowUser { user_id: i64 },
    AddKnowledgeBase { user_id: i64, kb_id: i64 },
    AddPaperToKnowledgeBase { kb_id: i64, paper_id: i64 },
    CreateKnowledgeBaseWithPapers { user_id: i64, kb_id: i64 },
    SendMessage { sender_id: i64, receiver_id: i64 },
    MarkMessagesAsRead { user_id: i64, other_id: i64 },
    ApprovePost { post_id: i64 },
    HidePost { post_id: i64 },
    DeletePost { post_id: i64 },
    ApproveComment { post_id: i64 },
    HideComment { post_id: i64 },
    DeleteComment,
}

impl MutationKind {
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::FollowUser { .. } => "followUser",
            MutationKind::UnfollowUser { .. } => "unfollowUser",
            MutationKind::AddKnowledgeBase { .. } => "addKnowledgeBase",
            MutationKind::AddPaperToKnowledgeBase { .. } => "addPaperToKnowledgeBase",
            MutationKind::CreateKnowledgeBaseWithPapers { .. } => "createKnowledgeBaseWithPapers",
            MutationKind::SendMessage { .. } => "sendMessage",
            MutationKind::MarkMessagesAsRead { .. } => "markMessagesAsRead",
            MutationKind::ApprovePost { .. } => "approvePost",
            MutationKind::HidePost { .. } => "hidePost",
            MutationKind::DeletePost { .. } => "deletePost",
            MutationKind::ApproveComment { .. } => "approveComment",
            MutationKind::HideComment { .. } => "hideComment",
            MutationKind::DeleteComment => "deleteComment",
        }
    }

    pub fn writes(&self) -> &'static [Entity] {
        use Entity::*;
        match self {
            MutationKind::FollowUser { .. } | MutationKind::UnfollowUser { .. } => &[User, FollowEdge],
            MutationKind::AddKnowledgeBase { .. } => &[KnowledgeBase],
            MutationKind::AddPaperToKnowledgeBase { .. }
            | MutationKind::CreateKnowledgeBaseWithPapers { .. } => &[KnowledgeBase, Paper],
            MutationKind::SendMessage { .. } | MutationKind::MarkMessagesAsRead { .. } => &[Message],
            MutationKind::ApprovePost { .. } | MutationKind::HidePost { .. } => &[Post],
            // Deleting a post drops its comments; deleting a comment moves the post's counter
            MutationKind::DeletePost { .. } | MutationKind::DeleteComment => &[Post, Comment],
            MutationKind::ApproveComment { .. } | MutationKind::HideComment { .. } => &[Comment],
        }
    }
}

/// Keys (or key prefixes) to mark stale once `mutation` succeeds
pub fn invalidations_for(mutation: &MutationKind) -> Vec<QueryKey> {
    match *mutation {
        MutationKind::FollowUser { user_id } | MutationKind::UnfollowUser { user_id } => vec![
            keys::following_list(),
            keys::current_user(),
            // Target's follower count, whether cached by id or by username
            QueryKey::new("user"),
            keys::is_following(user_id),
        ],
        MutationKind::AddKnowledgeBase { user_id, kb_id } => vec![
            keys::user_knowledge_bases(user_id),
            QueryKey::new("userKnowledgeBasesByUsername"),
            keys::all_knowledge_bases(),
            keys::knowledge_base(kb_id),
        ],
        MutationKind::AddPaperToKnowledgeBase { kb_id, paper_id } => vec![
            keys::knowledge_base(kb_id),
            QueryKey::new("userKnowledgeBases"),
            QueryKey::new("userKnowledgeBasesByUsername"),
            keys::all_knowledge_bases(),
            keys::paper(paper_id),
        ],
        MutationKind::CreateKnowledgeBaseWithPapers { user_id, kb_id } => vec![
            keys::user_knowledge_bases(user_id),
            QueryKey::new("userKnowledgeBasesByUsername"),
            keys::all_knowledge_bases(),
            keys::knowledge_base(kb_id),
            QueryKey::new("paper"),
        ],
        MutationKind::SendMessage {
            sender_id: a,
            receiver_id: b,
        }
        | MutationKind::MarkMessagesAsRead {
            user_id: a,
            other_id: b,
        } => vec![
            keys::messages(a, b),
            keys::messages(b, a),
            keys::conversations(a),
            keys::conversations(b),
        ],
        MutationKind::ApprovePost { .. } | MutationKind::HidePost { .. } => {
            vec![QueryKey::new("posts")]
        }
        MutationKind::DeletePost { post_id } => {
            vec![QueryKey::new("posts"), keys::post_comments(post_id)]
        }
        MutationKind::ApproveComment { post_id } | MutationKind::HideComment { post_id } => {
            vec![keys::post_comments(post_id)]
        }
        MutationKind::DeleteComment => vec![QueryKey::new("posts"), QueryKey::new("postComments")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mutations() -> Vec<MutationKind> {
        vec![
            MutationKind::FollowUser { user_id: 3 },
            MutationKind::UnfollowUser { user_id: 3 },
            MutationKind::AddKnowledgeBase { user_id: 0, kb_id: 6 },
            MutationKind::AddPaperToKnowledgeBase { kb_id: 3, paper_id: 7 },
            MutationKind::CreateKnowledgeBaseWithPapers { user_id: 0, kb_id: 6 },
            MutationKind::SendMessage {
                sender_id: 0,
                receiver_id: 1,
            },
            MutationKind::MarkMessagesAsRead { user_id: 0, other_id: 2 },
            MutationKind::ApprovePost { post_id: 2 },
            MutationKind::HidePost { post_id: 2 },
            MutationKind::DeletePost { post_id: 2 },
            MutationKind::ApproveComment { post_id: 1 },
            MutationKind::HideComment { post_id: 1 },
            MutationKind::DeleteComment,
        ]
    }

    fn overlaps(a: &QueryKey, b: &QueryKey) -> bool {
        a.starts_with(b) || b.starts_with(a)
    }

    #[test]
    fn test_every_dependent_read_is_invalidated() {
        for mutation in sample_mutations() {
            let invalidated = invalidations_for(&mutation);
            for query in QueryKind::ALL {
                let depends = query.reads().iter().any(|e| mutation.writes().contains(e));
                if !depends {
                    continue;
                }
                assert!(
                    invalidated.iter().any(|key| overlaps(key, &query.family())),
                    "{} leaves {:?} stale",
                    mutation.name(),
                    query
                );
            }
        }
    }

    #[test]
    fn test_follow_invalidates_following_list_and_current_user() {
        let stale = invalidations_for(&MutationKind::FollowUser { user_id: 4 });
        assert!(stale.contains(&keys::following_list()));
        assert!(stale.contains(&keys::current_user()));
        assert!(keys::user(4).starts_with(&stale[2]));
        assert!(keys::user_by_username("用户4").starts_with(&stale[2]));
    }

    #[test]
    fn test_send_message_covers_both_participants() {
        let stale = invalidations_for(&MutationKind::SendMessage {
            sender_id: 0,
            receiver_id: 1,
        });
        assert!(stale.contains(&keys::messages(0, 1)));
        assert!(stale.contains(&keys::conversations(0)));
        assert!(stale.contains(&keys::conversations(1)));
    }

    #[test]
    fn test_search_is_never_invalidated() {
        let family = QueryKind::SearchPapers.family();
        for mutation in sample_mutations() {
            assert!(!invalidations_for(&mutation).iter().any(|k| overlaps(k, &family)));
        }
    }
}
