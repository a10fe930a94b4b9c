use tower_sessions::Session;
use uuid::Uuid;

use crate::{error::Error, AppResult};

pub const USER_ID: &str = "user_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const RETURN_URL: &str = "return_url";

/// The signed-in user, or a validation error when the session has none.
pub async fn current_user(session: &Session) -> AppResult<Uuid> {
    match session.get::<Uuid>(USER_ID).await? {
        Some(user_id) => Ok(user_id),
        None => Err(Error::validation("not signed in").into()),
    }
}

/// `url` if it is a path on this site, `/` for anything a browser could
/// resolve to another host.
pub fn local_return_url(url: Option<&str>) -> &str {
    match url {
        Some(url)
            if url.starts_with('/')
                && !url.starts_with("//")
                && !url.starts_with("/\\")
                && !url.chars().any(char::is_control) =>
        {
            url
        }
        _ => "/",
    }
}
