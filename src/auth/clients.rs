use oauth2::{
    basic::{BasicClient, BasicErrorResponseType, BasicTokenType},
    AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    EmptyExtraTokenFields, EndpointNotSet, EndpointSet, RedirectUrl, RevocationErrorResponseType,
    Scope, StandardErrorResponse, StandardRevocableToken, StandardTokenIntrospectionResponse,
    StandardTokenResponse, TokenResponse, TokenUrl,
};
use serde_json::Value;

use crate::{config::LinkedInSettings, error::Error, AppResult, GetField};

/// `BasicClient` once the auth, redirect and token endpoints are set.
type LinkedInClient = Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

const AUTH_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const ME_URL: &str = "https://api.linkedin.com/v2/me";
const SCOPE: &str = "r_liteprofile";

/// Who LinkedIn says just signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInMember {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl LinkedInMember {
    fn from_me(body: &Value) -> AppResult<Self> {
        Ok(Self {
            id: body.get_str_field("id")?,
            first_name: body.get_str_field("localizedFirstName")?,
            last_name: body.get_str_field("localizedLastName")?,
        })
    }
}

#[derive(Clone)]
pub struct LinkedIn {
    client: LinkedInClient,
    http: reqwest::Client,
}

impl LinkedIn {
    pub fn new(settings: &LinkedInSettings) -> anyhow::Result<Self> {
        let client = BasicClient::new(ClientId::new(settings.client_id.clone()))
            .set_client_secret(ClientSecret::new(settings.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(AUTH_URL.to_owned())?)
            .set_token_uri(TokenUrl::new(TOKEN_URL.to_owned())?)
            .set_redirect_uri(RedirectUrl::new(settings.redirect_url.clone())?)
            .set_auth_type(AuthType::RequestBody);

        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client, http })
    }

    pub fn authorize_url(&self) -> (String, CsrfToken) {
        let (url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(SCOPE.to_owned()))
            .url();
        (url.to_string(), csrf_state)
    }

    pub async fn exchange(&self, code: AuthorizationCode) -> AppResult<LinkedInMember> {
        let token = self
            .client
            .exchange_code(code)
            .request_async(&self.http)
            .await
            .map_err(|e| Error::provider("linkedin", e))?;

        let body: Value = self
            .http
            .get(ME_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::provider("linkedin", e))?
            .json()
            .await?;

        LinkedInMember::from_me(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LinkedInSettings {
        LinkedInSettings {
            client_id: "client".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:8080/lockin/linkedin".into(),
        }
    }

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let linkedin = LinkedIn::new(&settings()).unwrap();
        let (url, state) = linkedin.authorize_url();

        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("scope=r_liteprofile"));
        assert!(url.contains(&format!("state={}", state.secret())));
    }

    #[test]
    fn reads_member_from_me() {
        let body = serde_json::json!({
            "id": "yrZCpj2Z12",
            "localizedFirstName": "Ada",
            "localizedLastName": "Lovelace",
        });
        let member = LinkedInMember::from_me(&body).unwrap();
        assert_eq!(member.first_name, "Ada");
        assert_eq!(member.id, "yrZCpj2Z12");

        assert!(LinkedInMember::from_me(&serde_json::json!({ "id": "x" })).is_err());
    }
}
