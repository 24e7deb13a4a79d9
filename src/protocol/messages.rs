//! Concrete wire message types. Each implements [`WireMessage`] with a fixed
//! ASCII name used in the frame header; dispatch afterwards never touches
//! that name again, it matches on the tagged [`ClientMessage`]/[`ServerMessage`]
//! enums instead.

use serde::{Deserialize, Serialize};

/// A type with a fixed wire name, encoded with bincode.
pub trait WireMessage: Serialize + for<'de> Deserialize<'de> {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandType {
    Popular,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginErrCode {
    LoginOk,
    NicknameExist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnterErrCode {
    EnterOk,
    InvalidRoomId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveErrCode {
    LeaveOk,
    NotInRoom,
    InvalidRoomId,
}

// ---- client -> server ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmLogin {
    pub nickname: String,
    pub send_time: i64,
}
impl WireMessage for CmLogin {
    const NAME: &'static str = "CMLogin";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmEnter {
    pub room_id: u32,
}
impl WireMessage for CmEnter {
    const NAME: &'static str = "CMEnter";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmLeave;
impl WireMessage for CmLeave {
    const NAME: &'static str = "CMLeave";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmChat {
    pub content: String,
    pub send_time: i64,
}
impl WireMessage for CmChat {
    const NAME: &'static str = "CMChat";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmCommandGm {
    pub cmd_type: CommandType,
    pub param: String,
}
impl WireMessage for CmCommandGm {
    const NAME: &'static str = "CMCommandGM";
}

// ---- server -> client ----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmRespLogin {
    pub err_code: LoginErrCode,
}
impl WireMessage for SmRespLogin {
    const NAME: &'static str = "SMRespLogin";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmRespEnter {
    pub err_code: EnterErrCode,
}
impl WireMessage for SmRespEnter {
    const NAME: &'static str = "SMRespEnter";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmRespLeave {
    pub err_code: LeaveErrCode,
}
impl WireMessage for SmRespLeave {
    const NAME: &'static str = "SMRespLeave";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmUserEnter {
    pub nickname: String,
    pub send_time: i64,
}
impl WireMessage for SmUserEnter {
    const NAME: &'static str = "SMUserEnter";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmUserLeave {
    pub nickname: String,
    pub send_time: i64,
}
impl WireMessage for SmUserLeave {
    const NAME: &'static str = "SMUserLeave";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmChatContent {
    pub nickname: String,
    pub content: String,
    pub send_time: i64,
}
impl WireMessage for SmChatContent {
    const NAME: &'static str = "SMChatContent";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmUserStats {
    pub nickname: String,
    pub stats: String,
}
impl WireMessage for SmUserStats {
    const NAME: &'static str = "SMUserStats";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmPopularWord {
    pub the_word: String,
}
impl WireMessage for SmPopularWord {
    const NAME: &'static str = "SMPopularWord";
}

/// Tagged union of every client-to-server message, used for dispatch after
/// the registry has decoded a frame. No runtime reflection past this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Login(CmLogin),
    Enter(CmEnter),
    Leave(CmLeave),
    Chat(CmChat),
    CommandGm(CmCommandGm),
}

macro_rules! impl_from {
    ($enum_ty:ident :: $variant:ident, $inner:ty) => {
        impl From<$inner> for $enum_ty {
            fn from(v: $inner) -> Self {
                $enum_ty::$variant(v)
            }
        }
    };
}

impl_from!(ClientMessage::Login, CmLogin);
impl_from!(ClientMessage::Enter, CmEnter);
impl_from!(ClientMessage::Leave, CmLeave);
impl_from!(ClientMessage::Chat, CmChat);
impl_from!(ClientMessage::CommandGm, CmCommandGm);

/// Tagged union of every server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    RespLogin(SmRespLogin),
    RespEnter(SmRespEnter),
    RespLeave(SmRespLeave),
    UserEnter(SmUserEnter),
    UserLeave(SmUserLeave),
    ChatContent(SmChatContent),
    UserStats(SmUserStats),
    PopularWord(SmPopularWord),
}

impl_from!(ServerMessage::RespLogin, SmRespLogin);
impl_from!(ServerMessage::RespEnter, SmRespEnter);
impl_from!(ServerMessage::RespLeave, SmRespLeave);
impl_from!(ServerMessage::UserEnter, SmUserEnter);
impl_from!(ServerMessage::UserLeave, SmUserLeave);
impl_from!(ServerMessage::ChatContent, SmChatContent);
impl_from!(ServerMessage::UserStats, SmUserStats);
impl_from!(ServerMessage::PopularWord, SmPopularWord);
