use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    error::{Error, GroupFailure, Result, SyncFailures},
    groups::{Group, GroupInfo},
};

use super::{ChatIdentity, ChatProvider, ChatUserId, InviteOutcome, RemoveOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub joined: Vec<Group>,
    pub left: Vec<Group>,
}

/// Pushes a membership delta to the chat service. Every group is attempted;
/// failures come back together as `Error::Sync`. Only an unresolvable chat
/// account stops the sync early.
pub async fn sync_user(
    chat: &dyn ChatProvider,
    identity: &ChatIdentity,
    added: &[GroupInfo],
    removed: &[GroupInfo],
) -> Result<SyncReport> {
    let chat_user = chat
        .find_or_create_user(&identity.username, &identity.password)
        .await?;
    info!(username = %identity.username, %chat_user, "chat user resolved");

    let joins = join_all(added.iter().map(|info| join_room(chat, &chat_user, &info.group)));
    let leaves = join_all(removed.iter().map(|info| leave_room(chat, &chat_user, &info.group)));
    let (joins, leaves) = futures_util::join!(joins, leaves);

    let mut report = SyncReport::default();
    let mut failures = Vec::new();
    for (info, result) in added.iter().zip(joins) {
        match result {
            Ok(()) => report.joined.push(info.group.clone()),
            Err(e) => failures.push(failure(&info.group, "join", e)),
        }
    }
    for (info, result) in removed.iter().zip(leaves) {
        match result {
            Ok(()) => report.left.push(info.group.clone()),
            Err(e) => failures.push(failure(&info.group, "leave", e)),
        }
    }

    if failures.is_empty() {
        Ok(report)
    } else {
        Err(SyncFailures { failures }.into())
    }
}

fn failure(group: &Group, action: &str, e: Error) -> GroupFailure {
    warn!(%group, action, error = %e, "chat sync failed for group");
    GroupFailure {
        group: group.clone(),
        reason: e.to_string(),
    }
}

async fn join_room(chat: &dyn ChatProvider, user: &ChatUserId, group: &Group) -> Result<()> {
    let room = chat.find_or_create_room(group.as_str()).await?;
    match chat.invite_user_to_room(user, &room).await? {
        InviteOutcome::Invited => info!(%user, %group, "joined room"),
        InviteOutcome::AlreadyMember => info!(%user, %group, "already in room"),
    }
    Ok(())
}

async fn leave_room(chat: &dyn ChatProvider, user: &ChatUserId, group: &Group) -> Result<()> {
    let Some(room) = chat.find_room(group.as_str()).await? else {
        info!(%group, "no room to leave");
        return Ok(());
    };
    match chat.remove_user_from_room(user, &room).await? {
        RemoveOutcome::Removed => info!(%user, %group, "left room"),
        RemoveOutcome::NotMember => info!(%user, %group, "was not in room"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        groups::GroupSource,
        test_support::{Call, FakeChat},
    };

    fn identity() -> ChatIdentity {
        ChatIdentity {
            username: "ada.lovelace".into(),
            password: "password".into(),
        }
    }

    fn school(name: &str) -> GroupInfo {
        GroupInfo::new(name, GroupSource::School)
    }

    #[tokio::test]
    async fn creates_user_and_rooms_then_invites() {
        let chat = FakeChat::default();
        let report = sync_user(&chat, &identity(), &[school("MIT"), school("Yale")], &[])
            .await
            .unwrap();

        assert_eq!(report.joined, vec![Group::new("MIT"), Group::new("Yale")]);
        assert!(chat.is_member("ada.lovelace", "MIT"));
        assert!(chat.is_member("ada.lovelace", "Yale"));
    }

    #[tokio::test]
    async fn repeating_a_sync_is_harmless() {
        let chat = FakeChat::default();
        sync_user(&chat, &identity(), &[school("MIT")], &[]).await.unwrap();
        let report = sync_user(&chat, &identity(), &[school("MIT")], &[]).await.unwrap();

        assert_eq!(report.joined, vec![Group::new("MIT")]);
        assert_eq!(chat.count(|c| matches!(c, Call::CreateRoom(_))), 1);
        assert_eq!(chat.count(|c| matches!(c, Call::CreateUser(_))), 1);
    }

    #[tokio::test]
    async fn room_created_by_someone_else_is_reused() {
        let chat = FakeChat::default();
        chat.race_room_creation("MIT");

        sync_user(&chat, &identity(), &[school("MIT")], &[]).await.unwrap();
        assert!(chat.is_member("ada.lovelace", "MIT"));
    }

    #[tokio::test]
    async fn removing_from_missing_room_or_non_member_succeeds() {
        let chat = FakeChat::default();
        chat.add_room("Acme");

        let report = sync_user(&chat, &identity(), &[], &[school("Acme"), school("Gone")])
            .await
            .unwrap();

        assert_eq!(report.left, vec![Group::new("Acme"), Group::new("Gone")]);
        assert_eq!(chat.count(|c| matches!(c, Call::Remove(_, _))), 1);
    }

    #[tokio::test]
    async fn one_failing_group_does_not_stop_the_rest() {
        let chat = FakeChat::default();
        chat.fail_room("Broken");

        let err = sync_user(&chat, &identity(), &[school("Broken"), school("MIT")], &[])
            .await
            .unwrap_err();

        let failures = match err {
            Error::Sync(failures) => failures,
            other => panic!("expected aggregate sync error, got {other}"),
        };
        assert_eq!(failures.groups().collect::<Vec<_>>(), vec![&Group::new("Broken")]);
        assert!(chat.is_member("ada.lovelace", "MIT"));
    }

    #[tokio::test]
    async fn unresolvable_user_stops_everything() {
        let chat = FakeChat::default();
        chat.fail_users();

        let err = sync_user(&chat, &identity(), &[school("MIT")], &[]).await.unwrap_err();

        assert!(matches!(err, Error::Provider { .. }));
        assert_eq!(chat.count(|c| matches!(c, Call::CreateRoom(_))), 0);
    }
}
