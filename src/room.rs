//! A room's state is mutated by exactly one task (the "room task"); no lock
//! guards it. Membership, the popularity tracker, and the offline ring are
//! only ever touched from inside [`run`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::offline::OfflineRing;
use crate::popular::PopularityTracker;
use crate::protocol::frame;
use crate::protocol::messages::{ServerMessage, SmChatContent, SmUserEnter, SmUserLeave};
use crate::user::UserHandle;

pub const MSG_QUEUE_LEN: usize = 40_960;
pub const MAX_OFFLINE_MSG: usize = 50;
pub const MAX_POPULAR_DURATION: Duration = Duration::from_secs(10 * 60);

/// One event accepted into a room's single, totally-ordered event stream.
pub enum RoomEvent {
    Enter(UserHandle),
    Leave(UserHandle),
    Chat {
        sender: UserHandle,
        /// Already filtered, already encoded — broadcast as-is.
        encoded: bytes::Bytes,
        chat_msg: SmChatContent,
        /// Pre-filter text, for popularity accounting only.
        raw_content: String,
    },
    PopularQuery {
        lately: Duration,
        reply: oneshot::Sender<Option<String>>,
    },
}

/// A cloneable reference to a running room task.
#[derive(Clone)]
pub struct RoomHandle {
    pub id: u32,
    tx: mpsc::Sender<RoomEvent>,
}

impl RoomHandle {
    /// Bounded-blocking: enter/leave are rare and must not be silently
    /// dropped the way chat frames can be.
    pub async fn enter(&self, user: UserHandle) {
        let _ = self.tx.send(RoomEvent::Enter(user)).await;
    }

    pub async fn leave(&self, user: UserHandle) {
        let _ = self.tx.send(RoomEvent::Leave(user)).await;
    }

    /// Submits a chat event; warns rather than blocking if the queue is
    /// close to full, but the event is submitted regardless.
    pub async fn chat(&self, sender: UserHandle, encoded: bytes::Bytes, chat_msg: SmChatContent, raw_content: String) {
        if self.tx.capacity() < MSG_QUEUE_LEN / 20 {
            warn!(room_id = self.id, "chat queue nearing capacity");
        }
        let _ = self
            .tx
            .send(RoomEvent::Chat {
                sender,
                encoded,
                chat_msg,
                raw_content,
            })
            .await;
    }

    pub async fn popular_word(&self, lately: Duration) -> Option<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(RoomEvent::PopularQuery {
                lately,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return None;
        }
        reply_rx.await.ok().flatten()
    }
}

/// Spawns the room task and returns a handle to it. Sensitive-word
/// filtering happens upstream, in [`crate::directory::Directory`], before a
/// chat event is ever submitted here — the room task only fans already
/// filtered bytes out to members.
pub fn spawn(id: u32) -> RoomHandle {
    let (tx, rx) = mpsc::channel(MSG_QUEUE_LEN);
    tokio::spawn(run(id, rx));
    RoomHandle { id, tx }
}

async fn run(id: u32, mut rx: mpsc::Receiver<RoomEvent>) {
    let mut members: HashMap<Arc<str>, UserHandle> = HashMap::new();
    let mut offline = OfflineRing::new(MAX_OFFLINE_MSG);
    let mut popularity = PopularityTracker::new(MAX_POPULAR_DURATION, Instant::now());

    info!(room_id = id, "room task started");

    while let Some(event) = rx.recv().await {
        match event {
            RoomEvent::Enter(user) => {
                members.insert(user.nickname.clone(), user.clone());
                let notice = SmUserEnter {
                    nickname: user.nickname.to_string(),
                    send_time: Utc::now().timestamp(),
                };
                broadcast_except(&members, &user, ServerMessage::UserEnter(notice));

                for msg in offline.replay() {
                    let _ = user.outbound.send_message(ServerMessage::ChatContent(msg));
                }
            }
            RoomEvent::Leave(user) => {
                members.remove(&user.nickname);
                let notice = SmUserLeave {
                    nickname: user.nickname.to_string(),
                    send_time: Utc::now().timestamp(),
                };
                broadcast_except(&members, &user, ServerMessage::UserLeave(notice));
            }
            RoomEvent::Chat {
                sender,
                encoded,
                chat_msg,
                raw_content,
            } => {
                let now = Instant::now();
                for token in raw_content.split_ascii_whitespace() {
                    popularity.record(token, now);
                }
                for (nickname, member) in members.iter() {
                    if *nickname == sender.nickname {
                        continue;
                    }
                    let _ = member.outbound.send_encoded(encoded.clone());
                }
                offline.save(chat_msg);
            }
            RoomEvent::PopularQuery { lately, reply } => {
                let word = popularity.top_word(lately, Instant::now());
                let _ = reply.send(word);
            }
        }
    }

    info!(room_id = id, "room task stopped");
}

fn broadcast_except(members: &HashMap<Arc<str>, UserHandle>, except: &UserHandle, msg: ServerMessage) {
    let encoded = match &msg {
        ServerMessage::UserEnter(m) => frame::encode_message(m).ok(),
        ServerMessage::UserLeave(m) => frame::encode_message(m).ok(),
        _ => None,
    };
    let Some(encoded) = encoded else { return };
    for (nickname, member) in members.iter() {
        if *nickname == except.nickname {
            continue;
        }
        let _ = member.outbound.send_encoded(encoded.clone());
    }
}
