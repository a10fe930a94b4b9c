use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    config::ChatSettings,
    error::{Error, Result},
};

use super::{types::*, ChatProvider, ChatUserId, InviteOutcome, RemoveOutcome, RoomId};

#[derive(Error, Debug)]
enum RocketError {
    #[error("{method} returned {status}: {} ({})", .body.error, .body.error_type)]
    Api {
        method: &'static str,
        status: u16,
        body: ErrorBody,
    },

    #[error("{method} returned an unreadable body: {source}")]
    Decode {
        method: &'static str,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl RocketError {
    fn error_type(&self) -> Option<&str> {
        match self {
            RocketError::Api { body, .. } => Some(body.error_type.as_str()),
            _ => None,
        }
    }

    fn is(&self, error_type: &str) -> bool {
        self.error_type() == Some(error_type)
    }

    fn is_unauthorized(&self) -> bool {
        matches!(self, RocketError::Api { status: 401, .. })
    }

    fn is_username_taken(&self) -> bool {
        match self {
            RocketError::Api { body, .. } => body.error.contains("is already in use"),
            _ => false,
        }
    }
}

impl From<RocketError> for Error {
    fn from(err: RocketError) -> Self {
        Error::provider("rocket", err)
    }
}

/// Rocket.Chat REST v1 client. Admin credentials come from one login and are
/// reused until the server rejects them with a 401.
pub struct RocketClient {
    http: reqwest::Client,
    base_url: String,
    admin_user: String,
    admin_password: String,
    email_domain: String,
    credentials: RwLock<Option<AdminCredentials>>,
}

impl RocketClient {
    pub fn new(settings: &ChatSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.rocket_url.trim_end_matches('/').to_owned(),
            admin_user: settings.admin_user.clone(),
            admin_password: settings.admin_password.clone(),
            email_domain: settings.email_domain.clone(),
            credentials: RwLock::new(None),
        }
    }

    /// Logs the admin in up front instead of on the first call.
    pub async fn init(&self) -> Result<()> {
        self.credentials().await?;
        info!(admin = %self.admin_user, "rocket client initialized");
        Ok(())
    }

    async fn credentials(&self) -> std::result::Result<AdminCredentials, RocketError> {
        if let Some(creds) = self.credentials.read().await.as_ref() {
            return Ok(creds.clone());
        }

        let mut slot = self.credentials.write().await;
        if let Some(creds) = slot.as_ref() {
            return Ok(creds.clone());
        }
        let creds = self.login().await?;
        *slot = Some(creds.clone());
        Ok(creds)
    }

    /// Drops `stale` so the next call logs in again. Credentials another call
    /// has already replaced are kept.
    async fn forget_credentials(&self, stale: &AdminCredentials) {
        let mut slot = self.credentials.write().await;
        if slot.as_ref().is_some_and(|creds| creds.auth_token == stale.auth_token) {
            *slot = None;
        }
    }

    async fn login(&self) -> std::result::Result<AdminCredentials, RocketError> {
        let request = self.http.post(self.url(LOGIN)).json(&LoginRequest {
            username: &self.admin_user,
            password: &self.admin_password,
        });
        let LoginResponse { data } = self.call(LOGIN, request).await?;
        Ok(AdminCredentials {
            auth_token: data.auth_token,
            user_id: data.user_id,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{API_PATH}/{method}", self.base_url)
    }

    /// Sends an admin request, logging in again once if the token was revoked
    /// or expired.
    async fn send_authed<T: DeserializeOwned>(
        &self,
        method: &'static str,
        build: impl Fn() -> RequestBuilder,
    ) -> std::result::Result<T, RocketError> {
        let creds = self.credentials().await?;
        match self.call(method, authed(build(), &creds)).await {
            Err(e) if e.is_unauthorized() => {
                info!(method, "admin token rejected, logging in again");
                self.forget_credentials(&creds).await;
                let creds = self.credentials().await?;
                self.call(method, authed(build(), &creds)).await
            }
            other => other,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, RocketError> {
        self.send_authed(method, || self.http.get(self.url(method)).query(query))
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &B,
    ) -> std::result::Result<T, RocketError> {
        self.send_authed(method, || self.http.post(self.url(method)).json(body))
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: RequestBuilder,
    ) -> std::result::Result<T, RocketError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = parse_error_body(&bytes);
            warn!(
                method,
                %status,
                error = %body.error,
                error_type = %body.error_type,
                "rocket call failed"
            );
            return Err(RocketError::Api {
                method,
                status: status.as_u16(),
                body,
            });
        }

        debug!(method, %status, "rocket call succeeded");
        serde_json::from_slice(&bytes).map_err(|source| RocketError::Decode { method, source })
    }

    async fn find_user(&self, username: &str) -> Result<Option<ChatUserId>> {
        match self.get::<UserResponse>(INFO_USER, &[("username", username)]).await {
            Ok(resp) => Ok(Some(ChatUserId(resp.user.id))),
            Err(e) if e.is(INVALID_USER) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<ChatUserId> {
        let email = format!("{username}@{}", self.email_domain);
        let request = CreateUserRequest {
            name: username,
            email: &email,
            username,
            password,
        };
        match self.post::<_, UserResponse>(CREATE_USER, &request).await {
            Ok(resp) => Ok(ChatUserId(resp.user.id)),
            Err(e) if e.is_username_taken() => {
                Err(Error::Duplicate(format!("chat user {username}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_room(&self, name: &str) -> Result<RoomId> {
        match self.post::<_, GroupResponse>(CREATE_GROUP, &CreateGroupRequest { name }).await {
            Ok(resp) => Ok(RoomId(resp.group.id)),
            Err(e) if e.is(DUPLICATE_ROOM_NAME) => Err(Error::Duplicate(format!("room {name}"))),
            Err(e) => Err(e.into()),
        }
    }
}

fn authed(request: RequestBuilder, creds: &AdminCredentials) -> RequestBuilder {
    request
        .header("X-Auth-Token", &creds.auth_token)
        .header("X-User-Id", &creds.user_id)
}

fn parse_error_body(bytes: &[u8]) -> ErrorBody {
    serde_json::from_slice(bytes).unwrap_or_else(|_| ErrorBody {
        error: String::from_utf8_lossy(bytes).into_owned(),
        ..Default::default()
    })
}

#[async_trait]
impl ChatProvider for RocketClient {
    async fn find_or_create_user(&self, username: &str, password: &str) -> Result<ChatUserId> {
        if let Some(id) = self.find_user(username).await? {
            return Ok(id);
        }

        match self.create_user(username, password).await {
            Ok(id) => {
                info!(username, %id, "created chat user");
                Ok(id)
            }
            Err(Error::Duplicate(_)) => self.find_user(username).await?.ok_or_else(|| {
                Error::provider("rocket", format!("user {username} exists but cannot be found"))
            }),
            Err(e) => Err(e),
        }
    }

    async fn find_or_create_room(&self, name: &str) -> Result<RoomId> {
        if let Some(id) = self.find_room(name).await? {
            return Ok(id);
        }

        match self.create_room(name).await {
            Ok(id) => {
                info!(room = name, %id, "created room");
                Ok(id)
            }
            Err(Error::Duplicate(_)) => self.find_room(name).await?.ok_or_else(|| {
                Error::provider("rocket", format!("room {name} exists but cannot be found"))
            }),
            Err(e) => Err(e),
        }
    }

    async fn find_room(&self, name: &str) -> Result<Option<RoomId>> {
        match self.get::<GroupResponse>(INFO_GROUP, &[("roomName", name)]).await {
            Ok(resp) => Ok(Some(RoomId(resp.group.id))),
            Err(e) if e.is(ROOM_NOT_FOUND) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn invite_user_to_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<InviteOutcome> {
        let request = MembershipRequest {
            room_id: &room.0,
            user_id: &user.0,
        };
        match self.post::<_, SuccessResponse>(INVITE, &request).await {
            Ok(SuccessResponse { success: true }) => Ok(InviteOutcome::Invited),
            Ok(_) => Ok(InviteOutcome::AlreadyMember),
            Err(e) if e.is(USER_ALREADY_IN_ROOM) => Ok(InviteOutcome::AlreadyMember),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_user_from_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<RemoveOutcome> {
        let request = MembershipRequest {
            room_id: &room.0,
            user_id: &user.0,
        };
        match self.post::<_, SuccessResponse>(KICK, &request).await {
            Ok(SuccessResponse { success: true }) => Ok(RemoveOutcome::Removed),
            Ok(_) => Ok(RemoveOutcome::NotMember),
            Err(e) if e.is(USER_NOT_IN_ROOM) => Ok(RemoveOutcome::NotMember),
            Err(e) => Err(e.into()),
        }
    }
}
