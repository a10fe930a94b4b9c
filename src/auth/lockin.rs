use axum::{
    debug_handler,
    extract::{Query, State},
    response::Redirect,
};
use oauth2::AuthorizationCode;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    db::SqliteStore,
    error::Error,
    session::{local_return_url, CSRF_STATE, RETURN_URL, USER_ID},
    store::UserStore,
    AppResult, AppState,
};

use super::LinkedIn;

#[derive(Deserialize)]
pub struct LockinQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn lockin(
    Query(LockinQuery { state, code }): Query<LockinQuery>,
    State(linkedin): State<LinkedIn>,
    State(store): State<SqliteStore>,
    session: Session,
) -> AppResult<Redirect> {
    let state = state.ok_or_else(|| Error::validation("OAuth: without state"))?;
    let code = code.ok_or_else(|| Error::validation("OAuth: without code"))?;
    let code = AuthorizationCode::new(code);

    let Some(stored_state) = session.remove::<String>(CSRF_STATE).await? else {
        return Err(Error::validation("no csrf_state").into());
    };
    if state != stored_state {
        return Err(Error::validation("csrf tokens don't match").into());
    }

    let member = linkedin.exchange(code).await?;
    let user = store
        .upsert_linkedin_user(&member.id, &member.first_name, &member.last_name)
        .await?;
    session.insert(USER_ID, user.id).await?;

    info!(user_id = %user.id, "signed in with linkedin");

    let return_url = session.remove::<String>(RETURN_URL).await?;
    Ok(Redirect::to(local_return_url(return_url.as_deref())))
}
