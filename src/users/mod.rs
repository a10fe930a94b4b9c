mod chat;
mod groups;
mod info;
mod linkedin;
mod refresh;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/linkedin-url", post(linkedin::set_linkedin_url))
        .route("/refresh", post(refresh::refresh))
        .route("/groups", get(groups::list_groups))
        .route("/groups/toggle", post(groups::toggle))
        .route("/chat/setup", post(chat::setup))
        .route("/info", get(info::info))
}
