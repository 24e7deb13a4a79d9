//! Translates decoded client requests into [`Directory`]/[`RoomHandle`]
//! calls and shapes the typed replies. Pure transport lives in
//! [`crate::connection`]; this module is where request semantics live.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::connection::ConnectionIo;
use crate::directory::Directory;
use crate::error::DomainError;
use crate::protocol::messages::{
    ClientMessage, CommandType, EnterErrCode, LeaveErrCode, LoginErrCode, ServerMessage, SmPopularWord,
    SmRespEnter, SmRespLeave, SmRespLogin, SmUserStats,
};
use crate::user::UserHandle;

const RELIABLE_REPLY_TIMEOUT: Duration = Duration::from_millis(300);

/// Drives one connection end to end: waits for login, then dispatches every
/// subsequent decoded message until the inbound channel closes.
pub async fn handle_connection(mut io: ConnectionIo<ClientMessage, ServerMessage>, directory: Arc<Directory>) {
    let peer_addr = io.peer_addr;
    let outbound = io.outbound.clone();

    let user = match wait_for_login(&mut io, &directory, peer_addr).await {
        Some(user) => user,
        None => return,
    };

    info!(%peer_addr, nickname = %user.nickname, "user logged in");

    while let Some(msg) = io.inbound.recv().await {
        if let Err(e) = dispatch(&msg, &user, &directory).await {
            debug!(nickname = %user.nickname, error = %e, "request rejected");
        }
    }

    directory.logout(&user).await;
    outbound.close();
    info!(%peer_addr, nickname = %user.nickname, "user disconnected");
}

async fn wait_for_login(
    io: &mut ConnectionIo<ClientMessage, ServerMessage>,
    directory: &Directory,
    peer_addr: std::net::SocketAddr,
) -> Option<UserHandle> {
    loop {
        let msg = io.inbound.recv().await?;
        let ClientMessage::Login(login) = msg else {
            debug!(%peer_addr, "ignoring message received before login");
            continue;
        };

        let user = UserHandle::new(login.nickname.clone(), peer_addr, io.outbound.clone());
        let ok = directory.login(user.clone()).await;
        let err_code = if ok {
            LoginErrCode::LoginOk
        } else {
            LoginErrCode::NicknameExist
        };
        let _ = user
            .outbound
            .send_message_reliable(
                ServerMessage::RespLogin(SmRespLogin { err_code }),
                RELIABLE_REPLY_TIMEOUT,
            )
            .await;

        if ok {
            return Some(user);
        }
        // nickname taken: this connection has no registered user yet, keep
        // waiting for another login attempt.
    }
}

async fn dispatch(msg: &ClientMessage, user: &UserHandle, directory: &Directory) -> Result<(), DomainError> {
    match msg {
        ClientMessage::Login(_) => {
            // already logged in on this connection; a second CMLogin is ignored.
            Ok(())
        }
        ClientMessage::Enter(enter) => {
            let err_code = match directory.enter_room(user, enter.room_id).await {
                Ok(()) => EnterErrCode::EnterOk,
                Err(_) => EnterErrCode::InvalidRoomId,
            };
            let _ = user
                .outbound
                .send_message_reliable(ServerMessage::RespEnter(SmRespEnter { err_code }), RELIABLE_REPLY_TIMEOUT)
                .await;
            Ok(())
        }
        ClientMessage::Leave(_) => {
            let err_code = match directory.leave_room(user).await {
                Ok(()) => LeaveErrCode::LeaveOk,
                Err(DomainError::NotInRoom) => LeaveErrCode::NotInRoom,
                Err(_) => LeaveErrCode::InvalidRoomId,
            };
            let _ = user
                .outbound
                .send_message_reliable(ServerMessage::RespLeave(SmRespLeave { err_code }), RELIABLE_REPLY_TIMEOUT)
                .await;
            Ok(())
        }
        ClientMessage::Chat(chat) => directory.chat_in_room(user, &chat.content, chat.send_time).await,
        ClientMessage::CommandGm(cmd) => {
            match cmd.cmd_type {
                CommandType::Popular => {
                    // a malformed room id defaults to 0, matching the source's
                    // best-effort GM command parsing.
                    let room_id: u32 = cmd.param.trim().parse().unwrap_or(0);
                    let word = directory
                        .popular_word(room_id, crate::room::MAX_POPULAR_DURATION)
                        .await
                        .unwrap_or_default();
                    let _ = user
                        .outbound
                        .send_message_reliable(
                            ServerMessage::PopularWord(SmPopularWord { the_word: word }),
                            RELIABLE_REPLY_TIMEOUT,
                        )
                        .await;
                }
                CommandType::Stats => {
                    let stats = match directory.stats(&cmd.param).await {
                        Some(target) => format!(
                            "LoginAt: {}  Online: {}s  RoomId: {}",
                            target.login_at.to_rfc3339(),
                            target.online_for().as_secs(),
                            target.room_id()
                        ),
                        None => "unknown user".to_string(),
                    };
                    let _ = user
                        .outbound
                        .send_message_reliable(
                            ServerMessage::UserStats(SmUserStats {
                                nickname: cmd.param.clone(),
                                stats,
                            }),
                            RELIABLE_REPLY_TIMEOUT,
                        )
                        .await;
                }
            }
            Ok(())
        }
    }
}

/// Stamps the current unix time, used by the interactive client and
/// benchmark driver when building outgoing `CMChat`/`CMLogin` frames.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
