pub mod auth;
pub mod chat;
pub mod config;
pub mod crawl;
pub mod db;
pub mod error;
pub mod groups;
pub mod membership;
pub mod profile;
pub mod res;
pub mod session;
pub mod store;
pub mod users;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    chat::ChatProvider, config::ChatSettings, crawl::CrawlProvider, db::SqliteStore, error::Error,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: SqliteStore,
    pub crawler: Arc<dyn CrawlProvider>,
    pub chat: Arc<dyn ChatProvider>,
    pub chat_settings: Arc<ChatSettings>,
    pub linkedin: auth::LinkedIn,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or(format!("expected {field} in {self}"))?
            .as_str()
            .ok_or(format!("expected {field} in {self} to be string"))?
            .to_owned()
        )
    }
}


pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<Error>() {
            Some(Error::Validation(_)) => StatusCode::BAD_REQUEST,
            Some(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(Error::Duplicate(_)) => StatusCode::CONFLICT,
            Some(Error::Provider { .. } | Error::Sync(_)) => StatusCode::BAD_GATEWAY,
            Some(Error::Store(_)) | None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
            (status, format!("{}\n\n{}", self.0, self.0.backtrace())).into_response()
        } else {
            warn!(%status, error = %self.0, "request rejected");
            (status, self.0.to_string()).into_response()
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(Error);
apperr_impl!(serde_json::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(reqwest::Error);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncFailures;

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (AppError::from(Error::validation("bad url")), StatusCode::BAD_REQUEST),
            (Error::not_found("user").into(), StatusCode::NOT_FOUND),
            (Error::provider("rocket", "down").into(), StatusCode::BAD_GATEWAY),
            (Error::from(SyncFailures { failures: vec![] }).into(), StatusCode::BAD_GATEWAY),
            (Error::Store(sqlx::Error::RowNotFound).into(), StatusCode::INTERNAL_SERVER_ERROR),
            ("plain".into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{}", err.0);
        }
    }

    #[test]
    fn get_field_reads_strings() {
        let json = serde_json::json!({ "id": "abc", "inner": { "n": 1 } });
        assert_eq!(json.get_str_field("id").unwrap(), "abc");
        assert!(json.get_str_field("inner").is_err());
        assert!(json.get_str_field("missing").is_err());
    }
}
