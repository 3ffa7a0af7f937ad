//! User entity

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Id of the signed-in user singleton
pub const CURRENT_USER_ID: i64 = 0;

const DEFAULT_LOCATION: &str = "海南";
const DEFAULT_EXPERIENCE: &str = "这个人很懒，什么都没有留下";

/// Deterministic avatar for a seed (user id or username)
pub fn avatar_url(seed: impl std::fmt::Display) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub followers: u64,
    pub following: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    /// Ids this user follows; only populated for the current user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub following_list: Vec<i64>,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>, followers: u64, following: u64) -> Self {
        let username = username.into();
        Self {
            id,
            avatar: avatar_url(id),
            username,
            followers,
            following,
            location: None,
            experience: None,
            following_list: Vec::new(),
        }
    }

    /// Stand-in for a user the store does not know.
    ///
    /// Structure is deterministic (username, avatar, profile defaults); only
    /// the social counters are random.
    pub fn placeholder<R: Rng + ?Sized>(
        id: i64,
        username: impl Into<String>,
        avatar_seed: impl std::fmt::Display,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            avatar: avatar_url(avatar_seed),
            followers: rng.gen_range(0..10_000),
            following: rng.gen_range(0..200),
            location: Some(DEFAULT_LOCATION.to_string()),
            experience: Some(DEFAULT_EXPERIENCE.to_string()),
            following_list: Vec::new(),
        }
    }

    /// Placeholder for an unknown numeric id: `用户{id}`
    pub fn placeholder_for_id<R: Rng + ?Sized>(id: i64, rng: &mut R) -> Self {
        Self::placeholder(id, format!("用户{}", id), id, rng)
    }

    pub fn follows(&self, user_id: i64) -> bool {
        self.following_list.contains(&user_id)
    }
}
