//! API handlers module

pub mod health;
pub mod knowledge_bases;
pub mod messages;
pub mod papers;
pub mod posts;
pub mod users;
