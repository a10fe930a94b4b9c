use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    chat::{ChatProvider, SyncReport},
    config::ChatSettings,
    db::SqliteStore,
    groups::{Group, GroupWithStatus},
    membership::toggle_group,
    session::current_user,
    store::GroupStore,
    AppResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct ToggleRequest {
    group: Group,
    status: bool,
}

#[debug_handler]
pub(crate) async fn list_groups(
    State(store): State<SqliteStore>,
    session: Session,
) -> AppResult<Json<Vec<GroupWithStatus>>> {
    let user_id = current_user(&session).await?;
    Ok(Json(store.get_groups_with_status(user_id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle(
    State(store): State<SqliteStore>,
    State(chat): State<Arc<dyn ChatProvider>>,
    State(settings): State<Arc<ChatSettings>>,
    session: Session,
    Json(ToggleRequest { group, status }): Json<ToggleRequest>,
) -> AppResult<Json<SyncReport>> {
    let user_id = current_user(&session).await?;
    let report = toggle_group(&store, &store, &*chat, &settings, user_id, &group, status).await?;
    Ok(Json(report))
}
