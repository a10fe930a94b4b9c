use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scraped snapshot of one LinkedIn profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub schools: Vec<School>,
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    pub degree: String,
    pub field_of_study: String,
    pub from_year: i32,
    pub to_year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub location: String,
    pub title: String,
    pub from_year: i32,
    pub to_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub linkedin_id: String,
    pub first_name: String,
    pub last_name: String,
    pub linkedin_url: Option<String>,
}

impl User {
    /// Preferred chat username. The store makes it unique and keeps it for good.
    pub fn base_chat_username(&self) -> String {
        let first = squash(&self.first_name);
        let last = squash(&self.last_name);
        match (first.is_empty(), last.is_empty()) {
            (true, true) => "user".to_owned() + &self.id.simple().to_string(),
            (false, true) => first,
            (true, false) => last,
            (false, false) => format!("{first}.{last}"),
        }
    }
}

fn squash(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
