use axum::{
    debug_handler,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::debug;

use crate::{
    session::{local_return_url, CSRF_STATE, RETURN_URL},
    AppResult,
};

use super::LinkedIn;

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn login(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
    State(linkedin): State<LinkedIn>,
    session: Session,
) -> AppResult<Redirect> {
    let (authorize_url, csrf_state) = linkedin.authorize_url();

    session.insert(CSRF_STATE, csrf_state.secret()).await?;
    if let Some(return_url) = return_url.as_deref() {
        session.insert(RETURN_URL, local_return_url(Some(return_url))).await?;
    }

    debug!("sending user to linkedin");
    Ok(Redirect::to(authorize_url.as_str()))
}
