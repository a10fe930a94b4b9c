use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub chat: ChatSettings,
    pub crawl: CrawlSettings,
    pub linkedin: LinkedInSettings,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub rocket_url: String,
    pub admin_user: String,
    pub admin_password: String,
    /// Placeholder password every provisioned chat account gets.
    pub user_password: String,
    pub email_domain: String,
}

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub phantom_url: String,
    pub agent_id: String,
    pub api_key: String,
    pub session_cookie: String,
}

#[derive(Debug, Clone)]
pub struct LinkedInSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl Config {
    /// Reads the process environment, with `.env` filling in anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR", "0.0.0.0:8080"),
            chat: ChatSettings {
                rocket_url: required("ROCKET_URL")?,
                admin_user: required("ROCKET_ADMIN_USER")?,
                admin_password: required("ROCKET_ADMIN_PASSWORD")?,
                user_password: optional("CHAT_USER_PASSWORD", "password"),
                email_domain: optional("CHAT_EMAIL_DOMAIN", "example.com"),
            },
            crawl: CrawlSettings {
                phantom_url: required("PHANTOM_URL")?,
                agent_id: required("PHANTOM_AGENT_ID")?,
                api_key: required("PHANTOM_API_KEY")?,
                session_cookie: required("PHANTOM_SESSION_COOKIE")?,
            },
            linkedin: LinkedInSettings {
                client_id: required("LINKEDIN_CLIENT_ID")?,
                client_secret: required("LINKEDIN_CLIENT_SECRET")?,
                redirect_url: required("LINKEDIN_REDIRECT_URL")?,
            },
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    dotenv::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_name_themselves() {
        let err = required("COHORTROOM_TEST_SURELY_UNSET").unwrap_err();
        assert_eq!(err.to_string(), "COHORTROOM_TEST_SURELY_UNSET must be set");
    }

    #[test]
    fn optional_keys_fall_back() {
        assert_eq!(optional("COHORTROOM_TEST_SURELY_UNSET", "example.com"), "example.com");
    }
}
