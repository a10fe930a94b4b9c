use serde::{Deserialize, Serialize};

pub(super) const API_PATH: &str = "api/v1";

pub(super) const LOGIN: &str = "login";
pub(super) const CREATE_USER: &str = "users.create";
pub(super) const INFO_USER: &str = "users.info";
pub(super) const CREATE_GROUP: &str = "groups.create";
pub(super) const INFO_GROUP: &str = "groups.info";
pub(super) const INVITE: &str = "groups.invite";
pub(super) const KICK: &str = "groups.kick";

pub(super) const INVALID_USER: &str = "error-invalid-user";
pub(super) const ROOM_NOT_FOUND: &str = "error-room-not-found";
pub(super) const DUPLICATE_ROOM_NAME: &str = "error-duplicate-channel-name";
pub(super) const USER_ALREADY_IN_ROOM: &str = "error-user-already-in-room";
pub(super) const USER_NOT_IN_ROOM: &str = "error-user-not-in-room";

#[derive(Debug, Clone)]
pub(super) struct AdminCredentials {
    pub(super) auth_token: String,
    pub(super) user_id: String,
}

/// Failure body of every REST v1 method.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub(super) success: bool,
    #[serde(default)]
    pub(super) error: String,
    #[serde(default)]
    pub(super) error_type: String,
}

#[derive(Serialize)]
pub(super) struct LoginRequest<'a> {
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LoginData {
    pub(super) user_id: String,
    pub(super) auth_token: String,
}

#[derive(Deserialize)]
pub(super) struct LoginResponse {
    pub(super) data: LoginData,
}

#[derive(Serialize)]
pub(super) struct CreateUserRequest<'a> {
    pub(super) name: &'a str,
    pub(super) email: &'a str,
    pub(super) username: &'a str,
    pub(super) password: &'a str,
}

#[derive(Deserialize)]
pub(super) struct Entity {
    #[serde(rename = "_id")]
    pub(super) id: String,
}

#[derive(Deserialize)]
pub(super) struct UserResponse {
    pub(super) user: Entity,
}

#[derive(Serialize)]
pub(super) struct CreateGroupRequest<'a> {
    pub(super) name: &'a str,
}

#[derive(Deserialize)]
pub(super) struct GroupResponse {
    pub(super) group: Entity,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MembershipRequest<'a> {
    pub(super) room_id: &'a str,
    pub(super) user_id: &'a str,
}

#[derive(Deserialize)]
pub(super) struct SuccessResponse {
    #[serde(default)]
    pub(super) success: bool,
}
