use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    groups::{Group, GroupInfo, GroupWithStatus},
    profile::{Company, Profile, School, User},
};

/// Per-user group membership rows. One row per (user, group name); rows are
/// only ever soft-removed through their status.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_groups_by_user_id(&self, user_id: Uuid) -> Result<Vec<GroupInfo>>;

    /// Insert-if-absent. Returns every group now recorded for the user.
    async fn add_groups_to_user(
        &self,
        user_id: Uuid,
        groups: &[GroupInfo],
    ) -> Result<Vec<GroupInfo>>;

    /// User-driven status change; remembers an opt-out.
    async fn toggle_group_status(&self, user_id: Uuid, group: &Group, status: bool) -> Result<()>;

    /// Derivation-driven status change; leaves the opt-out flag alone.
    async fn set_group_status(&self, user_id: Uuid, group: &Group, status: bool) -> Result<()>;

    async fn get_groups_with_status(&self, user_id: Uuid) -> Result<Vec<GroupWithStatus>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_linkedin_user(
        &self,
        linkedin_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User>;

    async fn get_user(&self, user_id: Uuid) -> Result<User>;

    async fn set_linkedin_url(&self, user_id: Uuid, url: &str) -> Result<()>;

    /// Replaces the stored name and school/company history with the crawl.
    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> Result<()>;

    async fn get_history(&self, user_id: Uuid) -> Result<(Vec<School>, Vec<Company>)>;

    /// The user's chat username. The first call stores `base`, or `base` with a
    /// numeric suffix when another user holds it; later calls return the stored
    /// value whatever `base` is.
    async fn claim_chat_username(&self, user_id: Uuid, base: &str) -> Result<String>;
}
