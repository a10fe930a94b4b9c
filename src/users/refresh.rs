use std::sync::Arc;

use axum::{debug_handler, extract::State, Json};
use tower_sessions::Session;

use crate::{
    chat::ChatProvider,
    config::ChatSettings,
    crawl::CrawlProvider,
    db::SqliteStore,
    membership::{refresh_profile, Refresh},
    session::current_user,
    AppResult, AppState,
};

#[debug_handler(state = AppState)]
pub(crate) async fn refresh(
    State(store): State<SqliteStore>,
    State(crawler): State<Arc<dyn CrawlProvider>>,
    State(chat): State<Arc<dyn ChatProvider>>,
    State(settings): State<Arc<ChatSettings>>,
    session: Session,
) -> AppResult<Json<Refresh>> {
    let user_id = current_user(&session).await?;
    let refresh = refresh_profile(&store, &store, &*crawler, &*chat, &settings, user_id).await?;
    Ok(Json(refresh))
}
