use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    groups::{Group, GroupInfo, GroupSource, GroupWithStatus},
    profile::{Company, Profile, School, User},
    res,
    store::{GroupStore, UserStore},
};

/// SQLite-backed `UserStore` + `GroupStore`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

type UserRow = (String, String, String, String, Option<String>);

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// An in-memory database lives and dies with its connection, so those get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(16)
        };
        let store = Self::new(options.connect(url).await?);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(res::SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn parse_uuid(s: &str) -> std::result::Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn parse_source(s: &str) -> std::result::Result<GroupSource, sqlx::Error> {
    s.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

fn user_from_row(row: UserRow) -> Result<User> {
    let (uuid, linkedin_id, first_name, last_name, linkedin_url) = row;
    Ok(User {
        id: parse_uuid(&uuid)?,
        linkedin_id,
        first_name,
        last_name,
        linkedin_url,
    })
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn upsert_linkedin_user(
        &self,
        linkedin_id: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (uuid,linkedin_id,first_name,last_name,created_at) \
             VALUES (?,?,?,?,?) \
             ON CONFLICT(linkedin_id) DO UPDATE \
             SET first_name=excluded.first_name, last_name=excluded.last_name",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(linkedin_id)
        .bind(first_name)
        .bind(last_name)
        .bind(now())
        .execute(&self.pool)
        .await?;

        let row: UserRow = sqlx::query_as(
            "SELECT uuid,linkedin_id,first_name,last_name,linkedin_url \
             FROM users WHERE linkedin_id=?",
        )
        .bind(linkedin_id)
        .fetch_one(&self.pool)
        .await?;
        let user = user_from_row(row)?;

        info!(user_id = %user.id, linkedin_id, "saved linkedin user");
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT uuid,linkedin_id,first_name,last_name,linkedin_url FROM users WHERE uuid=?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => user_from_row(row),
            None => Err(Error::not_found(format!("user {user_id}"))),
        }
    }

    async fn set_linkedin_url(&self, user_id: Uuid, url: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET linkedin_url=? WHERE uuid=?")
            .bind(url)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("user {user_id}")));
        }
        Ok(())
    }

    async fn save_profile(&self, user_id: Uuid, profile: &Profile) -> Result<()> {
        let id = user_id.to_string();
        let mut tx = self.pool.begin().await?;

        if !profile.first_name.is_empty() {
            let result = sqlx::query("UPDATE users SET first_name=?, last_name=? WHERE uuid=?")
                .bind(&profile.first_name)
                .bind(&profile.last_name)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(Error::not_found(format!("user {user_id}")));
            }
        }

        sqlx::query("DELETE FROM user_schools WHERE user_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        for (position, school) in profile.schools.iter().enumerate() {
            sqlx::query(
                "INSERT INTO user_schools \
                 (user_id,position,school_name,degree,field_of_study,from_year,to_year) \
                 VALUES (?,?,?,?,?,?,?)",
            )
            .bind(&id)
            .bind(position as i64)
            .bind(&school.name)
            .bind(&school.degree)
            .bind(&school.field_of_study)
            .bind(school.from_year)
            .bind(school.to_year)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM user_companies WHERE user_id=?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        for (position, company) in profile.companies.iter().enumerate() {
            sqlx::query(
                "INSERT INTO user_companies \
                 (user_id,position,company_name,location,title,from_year,to_year) \
                 VALUES (?,?,?,?,?,?,?)",
            )
            .bind(&id)
            .bind(position as i64)
            .bind(&company.name)
            .bind(&company.location)
            .bind(&company.title)
            .bind(company.from_year)
            .bind(company.to_year)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            %user_id,
            schools = profile.schools.len(),
            companies = profile.companies.len(),
            "saved profile history"
        );
        Ok(())
    }

    async fn get_history(&self, user_id: Uuid) -> Result<(Vec<School>, Vec<Company>)> {
        let id = user_id.to_string();
        let schools: Vec<(String, String, String, i32, i32)> = sqlx::query_as(
            "SELECT school_name,degree,field_of_study,from_year,to_year \
             FROM user_schools WHERE user_id=? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;
        let companies: Vec<(String, String, String, i32, i32)> = sqlx::query_as(
            "SELECT company_name,location,title,from_year,to_year \
             FROM user_companies WHERE user_id=? ORDER BY position",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        Ok((
            schools
                .into_iter()
                .map(|(name, degree, field_of_study, from_year, to_year)| School {
                    name,
                    degree,
                    field_of_study,
                    from_year,
                    to_year,
                })
                .collect(),
            companies
                .into_iter()
                .map(|(name, location, title, from_year, to_year)| Company {
                    name,
                    location,
                    title,
                    from_year,
                    to_year,
                })
                .collect(),
        ))
    }

    async fn claim_chat_username(&self, user_id: Uuid, base: &str) -> Result<String> {
        if let Some(username) = self.stored_chat_username(user_id).await? {
            return Ok(username);
        }

        let id = user_id.to_string();
        let mut attempt = 1;
        loop {
            let candidate = match attempt {
                1 => base.to_owned(),
                n => format!("{base}{n}"),
            };
            let result = sqlx::query(
                "UPDATE users SET chat_username=? WHERE uuid=? AND chat_username IS NULL",
            )
            .bind(&candidate)
            .bind(&id)
            .execute(&self.pool)
            .await;

            match result {
                Ok(done) if done.rows_affected() == 1 => {
                    info!(%user_id, username = candidate, "claimed chat username");
                    return Ok(candidate);
                }
                // a concurrent request claimed one first
                Ok(_) => {
                    return self
                        .stored_chat_username(user_id)
                        .await?
                        .ok_or_else(|| Error::not_found(format!("user {user_id}")));
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    debug!(%user_id, username = candidate, "chat username taken");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl SqliteStore {
    async fn stored_chat_username(&self, user_id: Uuid) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT chat_username FROM users WHERE uuid=?")
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        match row {
            Some((username,)) => Ok(username),
            None => Err(Error::not_found(format!("user {user_id}"))),
        }
    }
}

#[async_trait]
impl GroupStore for SqliteStore {
    async fn get_groups_by_user_id(&self, user_id: Uuid) -> Result<Vec<GroupInfo>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT group_name,group_source FROM user_groups WHERE user_id=? ORDER BY rowid",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(name, source)| -> Result<GroupInfo> {
                Ok(GroupInfo {
                    group: Group::new(name),
                    source: parse_source(&source)?,
                })
            })
            .collect()
    }

    async fn add_groups_to_user(
        &self,
        user_id: Uuid,
        groups: &[GroupInfo],
    ) -> Result<Vec<GroupInfo>> {
        let id = user_id.to_string();
        let mut tx = self.pool.begin().await?;
        for info in groups {
            let result = sqlx::query(
                "INSERT INTO user_groups \
                 (user_id,group_name,group_source,status,opted_out,inserted_at) \
                 VALUES (?,?,?,1,0,?) ON CONFLICT(user_id,group_name) DO NOTHING",
            )
            .bind(&id)
            .bind(info.group.as_str())
            .bind(info.source.as_str())
            .bind(now())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 1 {
                info!(%user_id, group = %info.group, "user joined group");
            } else {
                debug!(%user_id, group = %info.group, "group already recorded");
            }
        }
        tx.commit().await?;

        self.get_groups_by_user_id(user_id).await
    }

    async fn toggle_group_status(&self, user_id: Uuid, group: &Group, status: bool) -> Result<()> {
        let result = sqlx::query(
            "UPDATE user_groups SET status=?, opted_out=? WHERE user_id=? AND group_name=?",
        )
        .bind(status)
        .bind(!status)
        .bind(user_id.to_string())
        .bind(group.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("group {group} for user {user_id}")));
        }

        info!(%user_id, %group, status, "user toggled group");
        Ok(())
    }

    async fn set_group_status(&self, user_id: Uuid, group: &Group, status: bool) -> Result<()> {
        let result = sqlx::query("UPDATE user_groups SET status=? WHERE user_id=? AND group_name=?")
            .bind(status)
            .bind(user_id.to_string())
            .bind(group.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("group {group} for user {user_id}")));
        }
        Ok(())
    }

    async fn get_groups_with_status(&self, user_id: Uuid) -> Result<Vec<GroupWithStatus>> {
        let rows: Vec<(String, bool, String, bool)> = sqlx::query_as(
            "SELECT group_name,status,group_source,opted_out \
             FROM user_groups WHERE user_id=? ORDER BY rowid",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(name, status, source, opted_out)| -> Result<GroupWithStatus> {
                Ok(GroupWithStatus {
                    group: Group::new(name),
                    status,
                    source: parse_source(&source)?,
                    opted_out,
                })
            })
            .collect()
    }
}
