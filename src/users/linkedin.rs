use axum::{debug_handler, extract::State, http::StatusCode, Form};
use reqwest::Url;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::{
    db::SqliteStore,
    error::{Error, Result},
    session::current_user,
    store::UserStore,
    AppResult,
};

#[derive(Debug, Deserialize)]
pub(crate) struct LinkedInUrlForm {
    url: String,
}

#[debug_handler]
pub(crate) async fn set_linkedin_url(
    State(store): State<SqliteStore>,
    session: Session,
    Form(LinkedInUrlForm { url }): Form<LinkedInUrlForm>,
) -> AppResult<StatusCode> {
    let user_id = current_user(&session).await?;
    let url = validate_profile_url(&url)?;

    store.set_linkedin_url(user_id, &url).await?;
    info!(%user_id, url = %url, "linkedin url saved");

    Ok(StatusCode::NO_CONTENT)
}

/// Accepts `http(s)://[www.]linkedin.com/in/<handle>` and returns it without
/// query, fragment or trailing slash.
fn validate_profile_url(raw: &str) -> Result<String> {
    let invalid = || Error::validation(format!("{raw:?} is not a linkedin profile url"));

    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    let host = url.host_str().ok_or_else(invalid)?;
    if host != "linkedin.com" && !host.ends_with(".linkedin.com") {
        return Err(invalid());
    }

    let mut segments = url.path_segments().ok_or_else(invalid)?.filter(|s| !s.is_empty());
    match (segments.next(), segments.next(), segments.next()) {
        (Some("in"), Some(_handle), None) => {}
        _ => return Err(invalid()),
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_profile_urls() {
        assert_eq!(
            validate_profile_url("https://www.linkedin.com/in/ada-lovelace/?trk=nav").unwrap(),
            "https://www.linkedin.com/in/ada-lovelace"
        );
        assert_eq!(
            validate_profile_url(" http://linkedin.com/in/ada ").unwrap(),
            "http://linkedin.com/in/ada"
        );
    }

    #[test]
    fn rejects_everything_else() {
        for raw in [
            "",
            "linkedin.com/in/ada",
            "https://www.linkedin.com/company/acme",
            "https://www.linkedin.com/in/",
            "https://evil-linkedin.com/in/ada",
            "ftp://www.linkedin.com/in/ada",
            "https://www.linkedin.com/in/ada/details/skills",
        ] {
            assert!(
                matches!(validate_profile_url(raw), Err(Error::Validation(_))),
                "{raw}"
            );
        }
    }
}
