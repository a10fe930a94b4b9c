mod rocket;
mod sync;
mod types;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::ChatSettings, error::Result};

pub use rocket::RocketClient;
pub use sync::{sync_user, SyncReport};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatUserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for ChatUserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteOutcome {
    Invited,
    AlreadyMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotMember,
}

/// External chat service. Implementations absorb duplicate creates and
/// repeated membership changes.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn find_or_create_user(&self, username: &str, password: &str) -> Result<ChatUserId>;

    async fn find_or_create_room(&self, name: &str) -> Result<RoomId>;

    async fn find_room(&self, name: &str) -> Result<Option<RoomId>>;

    async fn invite_user_to_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<InviteOutcome>;

    async fn remove_user_from_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<RemoveOutcome>;
}

/// Who a user is on the chat side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatIdentity {
    pub username: String,
    pub password: String,
}

impl ChatIdentity {
    pub fn new(username: String, settings: &ChatSettings) -> Self {
        Self {
            username,
            password: settings.user_password.clone(),
        }
    }
}
