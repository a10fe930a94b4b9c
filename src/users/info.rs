use axum::{debug_handler, extract::State, Json};
use serde::Serialize;
use tower_sessions::Session;

use crate::{
    db::SqliteStore,
    groups::GroupWithStatus,
    profile::{Company, School, User},
    session::current_user,
    store::{GroupStore, UserStore},
    AppResult,
};

#[derive(Serialize)]
pub(crate) struct UserInfo {
    user: User,
    schools: Vec<School>,
    companies: Vec<Company>,
    groups: Vec<GroupWithStatus>,
}

#[debug_handler]
pub(crate) async fn info(
    State(store): State<SqliteStore>,
    session: Session,
) -> AppResult<Json<UserInfo>> {
    let user_id = current_user(&session).await?;
    let user = store.get_user(user_id).await?;
    let (schools, companies) = store.get_history(user_id).await?;
    let groups = store.get_groups_with_status(user_id).await?;

    Ok(Json(UserInfo {
        user,
        schools,
        companies,
        groups,
    }))
}
