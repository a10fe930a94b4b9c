mod phantom;

use async_trait::async_trait;

use crate::{error::Result, profile::Profile};

pub use phantom::PhantomClient;

/// Scrapes a public LinkedIn profile.
#[async_trait]
pub trait CrawlProvider: Send + Sync {
    async fn get_user_profile(&self, linkedin_url: &str) -> Result<Profile>;
}
