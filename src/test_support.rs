use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    chat::{ChatProvider, ChatUserId, InviteOutcome, RemoveOutcome, RoomId},
    crawl::CrawlProvider,
    db::SqliteStore,
    error::{Error, Result},
    profile::{Profile, User},
    store::UserStore,
};

pub async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:").await.unwrap()
}

pub async fn seed_user(store: &SqliteStore) -> User {
    store.upsert_linkedin_user("li-ada", "Ada", "Lovelace").await.unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateUser(String),
    CreateRoom(String),
    Invite(ChatUserId, RoomId),
    Remove(ChatUserId, RoomId),
}

#[derive(Default)]
struct ChatState {
    users: HashMap<String, ChatUserId>,
    rooms: HashMap<String, RoomId>,
    members: HashSet<(ChatUserId, RoomId)>,
    calls: Vec<Call>,
    hidden_once: HashSet<String>,
    failing_rooms: HashSet<String>,
    fail_users: bool,
}

/// In-memory chat service that behaves like the real adapter: duplicate
/// creates fall back to a lookup and repeated membership changes are no-ops.
#[derive(Default)]
pub struct FakeChat {
    state: Mutex<ChatState>,
}

impl FakeChat {
    pub fn add_room(&self, name: &str) -> RoomId {
        let mut state = self.state.lock().unwrap();
        let id = RoomId(format!("r-{name}"));
        state.rooms.insert(name.to_owned(), id.clone());
        id
    }

    /// The room exists but the first lookup misses it, so the create races.
    pub fn race_room_creation(&self, name: &str) {
        self.add_room(name);
        self.state.lock().unwrap().hidden_once.insert(name.to_owned());
    }

    pub fn fail_room(&self, name: &str) {
        self.state.lock().unwrap().failing_rooms.insert(name.to_owned());
    }

    pub fn heal_room(&self, name: &str) {
        self.state.lock().unwrap().failing_rooms.remove(name);
    }

    pub fn fail_users(&self) {
        self.state.lock().unwrap().fail_users = true;
    }

    pub fn is_member(&self, username: &str, room: &str) -> bool {
        let state = self.state.lock().unwrap();
        match (state.users.get(username), state.rooms.get(room)) {
            (Some(user), Some(room)) => state.members.contains(&(user.clone(), room.clone())),
            _ => false,
        }
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn lookup_room(&self, name: &str) -> Result<Option<RoomId>> {
        let mut state = self.state.lock().unwrap();
        if state.failing_rooms.contains(name) {
            return Err(Error::provider("fake chat", format!("room {name} is broken")));
        }
        if state.hidden_once.remove(name) {
            return Ok(None);
        }
        Ok(state.rooms.get(name).cloned())
    }

    fn create_room(&self, name: &str) -> Result<RoomId> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateRoom(name.to_owned()));
        if state.rooms.contains_key(name) {
            return Err(Error::Duplicate(format!("room {name}")));
        }
        let id = RoomId(format!("r-{name}"));
        state.rooms.insert(name.to_owned(), id.clone());
        Ok(id)
    }
}

#[async_trait]
impl ChatProvider for FakeChat {
    async fn find_or_create_user(&self, username: &str, _password: &str) -> Result<ChatUserId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_users {
            return Err(Error::provider("fake chat", "users are down"));
        }
        if let Some(id) = state.users.get(username) {
            return Ok(id.clone());
        }
        state.calls.push(Call::CreateUser(username.to_owned()));
        let id = ChatUserId(format!("u-{username}"));
        state.users.insert(username.to_owned(), id.clone());
        Ok(id)
    }

    async fn find_or_create_room(&self, name: &str) -> Result<RoomId> {
        if let Some(id) = self.lookup_room(name)? {
            return Ok(id);
        }
        match self.create_room(name) {
            Err(Error::Duplicate(_)) => self
                .lookup_room(name)?
                .ok_or_else(|| Error::not_found(format!("room {name}"))),
            other => other,
        }
    }

    async fn find_room(&self, name: &str) -> Result<Option<RoomId>> {
        self.lookup_room(name)
    }

    async fn invite_user_to_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<InviteOutcome> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Invite(user.clone(), room.clone()));
        if state.members.insert((user.clone(), room.clone())) {
            Ok(InviteOutcome::Invited)
        } else {
            Ok(InviteOutcome::AlreadyMember)
        }
    }

    async fn remove_user_from_room(
        &self,
        user: &ChatUserId,
        room: &RoomId,
    ) -> Result<RemoveOutcome> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Remove(user.clone(), room.clone()));
        if state.members.remove(&(user.clone(), room.clone())) {
            Ok(RemoveOutcome::Removed)
        } else {
            Ok(RemoveOutcome::NotMember)
        }
    }
}

/// Hands back whatever profile it was last given.
#[derive(Default)]
pub struct FakeCrawler {
    profile: Mutex<Option<Profile>>,
    crawled: Mutex<Vec<String>>,
}

impl FakeCrawler {
    pub fn returning(profile: Profile) -> Self {
        let crawler = Self::default();
        crawler.set(profile);
        crawler
    }

    pub fn set(&self, profile: Profile) {
        *self.profile.lock().unwrap() = Some(profile);
    }

    pub fn crawled(&self) -> Vec<String> {
        self.crawled.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrawlProvider for FakeCrawler {
    async fn get_user_profile(&self, linkedin_url: &str) -> Result<Profile> {
        self.crawled.lock().unwrap().push(linkedin_url.to_owned());
        self.profile
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::provider("fake crawl", "profile is private"))
    }
}
