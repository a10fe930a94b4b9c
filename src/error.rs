use std::fmt;

use thiserror::Error;

use crate::groups::Group;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Creating something that already exists. Adapters swallow this one.
    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Sync(#[from] SyncFailures),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn provider(provider: &'static str, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFailure {
    pub group: Group,
    pub reason: String,
}

/// Chat-side failures collected over one sync. The store already holds the
/// intended state, so a later sync converges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct SyncFailures {
    pub failures: Vec<GroupFailure>,
}

impl SyncFailures {
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.failures.iter().map(|f| &f.group)
    }
}

impl fmt::Display for SyncFailures {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to sync {} group(s):", self.failures.len())?;
        for failure in &self.failures {
            write!(f, " [{}: {}]", failure.group, failure.reason)?;
        }
        Ok(())
    }
}
