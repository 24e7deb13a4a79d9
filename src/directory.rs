//! Global nickname registry and roomId -> room map. Owned by one [`Server`]
//! value rather than process-wide statics, so each test can build its own.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::DomainError;
use crate::filter::Filter;
use crate::protocol::frame;
use crate::protocol::messages::SmChatContent;
use crate::room::{self, RoomHandle};
use crate::user::UserHandle;

pub const N_ROOMS: u32 = 5;

pub struct Directory {
    nicknames: RwLock<HashMap<Arc<str>, UserHandle>>,
    rooms: HashMap<u32, RoomHandle>,
    pub filter: Arc<Filter>,
}

impl Directory {
    /// Boots `N_ROOMS` room tasks and returns a directory ready to accept
    /// logins.
    pub fn new(filter: Arc<Filter>) -> Self {
        let mut rooms = HashMap::new();
        for id in 1..=N_ROOMS {
            rooms.insert(id, room::spawn(id));
        }
        Directory {
            nicknames: RwLock::new(HashMap::new()),
            rooms,
            filter,
        }
    }

    /// Insert-if-absent on the nickname map. Returns whether the login
    /// succeeded (false if the nickname is already taken).
    pub async fn login(&self, user: UserHandle) -> bool {
        let mut nicknames = self.nicknames.write().await;
        if nicknames.contains_key(&user.nickname) {
            return false;
        }
        nicknames.insert(user.nickname.clone(), user);
        true
    }

    /// Leaves the user's current room (if any) then removes its nickname
    /// entry. Returns whether the user was actually logged in.
    pub async fn logout(&self, user: &UserHandle) -> bool {
        let _ = self.leave_room(user).await;
        let mut nicknames = self.nicknames.write().await;
        nicknames.remove(&user.nickname).is_some()
    }

    pub fn room(&self, room_id: u32) -> Option<&RoomHandle> {
        self.rooms.get(&room_id)
    }

    pub async fn enter_room(&self, user: &UserHandle, room_id: u32) -> Result<(), DomainError> {
        let room = self.room(room_id).ok_or(DomainError::InvalidRoom(room_id))?;
        room.enter(user.clone()).await;
        user.set_room_id(room_id);
        Ok(())
    }

    /// A no-op `roomId == 0` is reported as `NotInRoom` without touching
    /// any room; a room id that no longer resolves is `InvalidRoom`.
    pub async fn leave_room(&self, user: &UserHandle) -> Result<(), DomainError> {
        let room_id = user.room_id();
        if room_id == 0 {
            return Err(DomainError::NotInRoom);
        }
        let room = self.room(room_id).ok_or(DomainError::InvalidRoom(room_id))?;
        room.leave(user.clone()).await;
        user.set_room_id(0);
        Ok(())
    }

    /// Applies the sensitive-word filter to `content`, encodes the result
    /// once, and submits it to the sender's room. Popularity accounting
    /// uses the pre-filter text.
    pub async fn chat_in_room(&self, user: &UserHandle, content: &str, send_time: i64) -> Result<(), DomainError> {
        let room_id = user.room_id();
        if room_id == 0 {
            return Err(DomainError::NotInRoom);
        }
        let room = self.room(room_id).ok_or(DomainError::InvalidRoom(room_id))?;

        let mut filtered = content.as_bytes().to_vec();
        self.filter.filter(&mut filtered);
        let filtered_content = String::from_utf8_lossy(&filtered).into_owned();

        let chat_msg = SmChatContent {
            nickname: user.nickname.to_string(),
            content: filtered_content,
            send_time,
        };
        let encoded = frame::encode_message(&chat_msg).map_err(|_| DomainError::InvalidRoom(room_id))?;

        room.chat(user.clone(), encoded, chat_msg, content.to_string()).await;
        Ok(())
    }

    pub async fn popular_word(&self, room_id: u32, lately: Duration) -> Option<String> {
        let room = self.room(room_id)?;
        room.popular_word(lately).await
    }

    pub async fn stats(&self, nickname: &str) -> Option<UserHandle> {
        let nicknames = self.nicknames.read().await;
        nicknames.get(nickname).cloned()
    }
}
