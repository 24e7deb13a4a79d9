use thiserror::Error;

/// Fatal at startup: a bad dictionary, a duplicate message registration, or
/// a handler/parser missing from the listener configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dictionary entry {0:?} contains a non-ASCII byte")]
    NotAscii(String),

    #[error("failed to read dictionary file {path}: {source}")]
    DictionaryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("message type {0:?} registered twice")]
    DuplicateRegistration(String),

    #[error("invalid listen/dial address {0:?}: {1}")]
    InvalidAddr(String, std::net::AddrParseError),
}

/// Framing/decoding failures. These end the connection; they never panic.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame of {0} bytes exceeds MAX_FRAME_BYTES")]
    FrameTooLarge(usize),

    #[error("connection closed while reading a frame")]
    Eof,

    #[error("unknown message type {0:?}")]
    UnknownType(String),

    #[error("failed to decode payload for {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: Box<bincode::ErrorKind>,
    },

    #[error("failed to encode payload for {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: Box<bincode::ErrorKind>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcome of attempting to hand a frame to a connection's outbound queue.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("connection is closing")]
    ConnClosing,

    #[error("outbound queue is full")]
    WriteBlocking,
}

/// Domain-level rejections reported back to the client as typed response
/// codes; these never close the connection.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("nickname already in use")]
    NicknameTaken,

    #[error("room {0} does not exist")]
    InvalidRoom(u32),

    #[error("user is not in a room")]
    NotInRoom,

    #[error("unknown user {0:?}")]
    UnknownUser(String),
}
