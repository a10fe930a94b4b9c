//! Request-scoped workflows. Each one takes only the capabilities it touches.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    chat::{sync_user, ChatIdentity, ChatProvider, SyncReport},
    config::ChatSettings,
    crawl::CrawlProvider,
    error::{Error, Result},
    groups::{derive_groups, reconcile_groups, Group, GroupInfo, Reconciliation},
    profile::{Profile, User},
    store::{GroupStore, UserStore},
};

#[derive(Debug, Clone, Serialize)]
pub struct Refresh {
    pub profile: Profile,
    #[serde(skip)]
    pub reconciliation: Reconciliation,
    pub joined: Vec<Group>,
    pub left: Vec<Group>,
}

/// Re-crawls the user's LinkedIn profile, stores it, and brings group rows and
/// chat membership in line with what it now derives.
pub async fn refresh_profile(
    users: &dyn UserStore,
    groups: &dyn GroupStore,
    crawler: &dyn CrawlProvider,
    chat: &dyn ChatProvider,
    settings: &ChatSettings,
    user_id: Uuid,
) -> Result<Refresh> {
    let user = users.get_user(user_id).await?;
    let Some(linkedin_url) = user.linkedin_url.as_deref() else {
        return Err(Error::validation("no linkedin url on record"));
    };

    let profile = crawler.get_user_profile(linkedin_url).await?;
    users.save_profile(user_id, &profile).await?;

    let derived = derive_groups(&profile);
    let reconciliation = reconcile_groups(groups, user_id, derived).await?;

    // a first claim should see the crawled name
    let user = users.get_user(user_id).await?;
    let identity = chat_identity(users, &user, settings).await?;
    let SyncReport { joined, left } =
        sync_user(chat, &identity, &reconciliation.to_join(), &reconciliation.removed).await?;

    info!(%user_id, joined = joined.len(), left = left.len(), "refreshed profile");
    Ok(Refresh {
        profile,
        reconciliation,
        joined,
        left,
    })
}

/// Switches one group on or off at the user's request and mirrors it in chat.
pub async fn toggle_group(
    users: &dyn UserStore,
    groups: &dyn GroupStore,
    chat: &dyn ChatProvider,
    settings: &ChatSettings,
    user_id: Uuid,
    group: &Group,
    status: bool,
) -> Result<SyncReport> {
    let row = groups
        .get_groups_with_status(user_id)
        .await?
        .into_iter()
        .find(|row| &row.group == group)
        .ok_or_else(|| Error::not_found(format!("group {group} for user {user_id}")))?;

    groups.toggle_group_status(user_id, group, status).await?;
    info!(%user_id, %group, status, "toggled group");

    let user = users.get_user(user_id).await?;
    let identity = chat_identity(users, &user, settings).await?;
    let info = [row.info()];
    if status {
        sync_user(chat, &identity, &info, &[]).await
    } else {
        sync_user(chat, &identity, &[], &info).await
    }
}

/// Pushes the full stored state to chat: joins every active group's room and
/// leaves every inactive one. Also the retry path after a failed sync.
pub async fn setup_chat(
    users: &dyn UserStore,
    groups: &dyn GroupStore,
    chat: &dyn ChatProvider,
    settings: &ChatSettings,
    user_id: Uuid,
) -> Result<SyncReport> {
    let user = users.get_user(user_id).await?;
    let (active, inactive): (Vec<_>, Vec<_>) = groups
        .get_groups_with_status(user_id)
        .await?
        .into_iter()
        .partition(|row| row.status);
    let active: Vec<GroupInfo> = active.iter().map(|row| row.info()).collect();
    let inactive: Vec<GroupInfo> = inactive.iter().map(|row| row.info()).collect();

    let identity = chat_identity(users, &user, settings).await?;
    sync_user(chat, &identity, &active, &inactive).await
}

async fn chat_identity(
    users: &dyn UserStore,
    user: &User,
    settings: &ChatSettings,
) -> Result<ChatIdentity> {
    let username = users.claim_chat_username(user.id, &user.base_chat_username()).await?;
    Ok(ChatIdentity::new(username, settings))
}
