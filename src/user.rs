use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::connection::OutboundHandle;
use crate::protocol::messages::ServerMessage;

static NEXT_USER_ID: AtomicU64 = AtomicU64::new(1);

/// A handle to a logged-in user, cheap to clone and shared between the
/// directory, rooms, and the owning connection's dispatch task. `room_id`
/// is the only field other tasks mutate concurrently, so it is atomic;
/// everything else is fixed for the life of the user.
#[derive(Clone)]
pub struct UserHandle {
    pub id: u64,
    pub nickname: Arc<str>,
    pub addr: SocketAddr,
    pub login_at: DateTime<Utc>,
    login_instant: Instant,
    room_id: Arc<AtomicU32>,
    pub outbound: OutboundHandle<ServerMessage>,
}

impl UserHandle {
    pub fn new(nickname: String, addr: SocketAddr, outbound: OutboundHandle<ServerMessage>) -> Self {
        UserHandle {
            id: NEXT_USER_ID.fetch_add(1, Ordering::Relaxed),
            nickname: Arc::from(nickname),
            addr,
            login_at: Utc::now(),
            login_instant: Instant::now(),
            room_id: Arc::new(AtomicU32::new(0)),
            outbound,
        }
    }

    pub fn room_id(&self) -> u32 {
        self.room_id.load(Ordering::Acquire)
    }

    pub fn set_room_id(&self, room_id: u32) {
        self.room_id.store(room_id, Ordering::Release);
    }

    pub fn online_for(&self) -> std::time::Duration {
        self.login_instant.elapsed()
    }
}

impl PartialEq for UserHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for UserHandle {}
