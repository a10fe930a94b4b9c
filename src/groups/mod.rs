mod derive;
mod reconcile;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use derive::derive_groups;
pub use reconcile::{dedup_by_name, difference, reconcile_groups, Reconciliation};

/// Group name, e.g. `ColoradoStateUniversity` or `HungryHour-Sunnyvale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSource {
    School,
    Company,
}

impl GroupSource {
    pub fn as_str(&self) -> &'static str {
        use GroupSource::*;
        match self {
            School => "school",
            Company => "company",
        }
    }
}

impl FromStr for GroupSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school" => Ok(GroupSource::School),
            "company" => Ok(GroupSource::Company),
            other => Err(format!("unknown group source {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group: Group,
    pub source: GroupSource,
}

impl GroupInfo {
    pub fn new(group: impl Into<String>, source: GroupSource) -> Self {
        Self {
            group: Group::new(group),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupWithStatus {
    pub group: Group,
    pub status: bool,
    pub source: GroupSource,
    /// Set when the user switched this group off themselves.
    pub opted_out: bool,
}

impl GroupWithStatus {
    pub fn info(&self) -> GroupInfo {
        GroupInfo {
            group: self.group.clone(),
            source: self.source,
        }
    }
}
