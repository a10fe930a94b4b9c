mod clients;
mod login;
mod lockin;
mod logout;

use axum::{routing::get, Router};

use crate::AppState;

pub use clients::{LinkedIn, LinkedInMember};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login/linkedin", get(login::login))
        .route("/lockin/linkedin", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}
