use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use tower_sessions::Session;

use crate::{
    chat::{ChatProvider, SyncReport},
    config::ChatSettings,
    db::SqliteStore,
    membership::setup_chat,
    session::current_user,
    AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn setup(
    State(store): State<SqliteStore>,
    State(chat): State<Arc<dyn ChatProvider>>,
    State(settings): State<Arc<ChatSettings>>,
    session: Session,
) -> AppResult<Json<SyncReport>> {
    let user_id = current_user(&session).await?;
    Ok(Json(setup_chat(&store, &store, &*chat, &settings, user_id).await?))
}
