pub mod frame;
pub mod messages;
pub mod registry;

use crate::error::ConfigError;
use messages::{
    ClientMessage, CmChat, CmCommandGm, CmEnter, CmLeave, CmLogin, ServerMessage, SmChatContent,
    SmPopularWord, SmRespEnter, SmRespLeave, SmRespLogin, SmUserEnter, SmUserLeave, SmUserStats,
};
use registry::Registry;

/// Builds the registry the server uses to decode incoming client frames.
pub fn client_registry() -> Result<Registry<ClientMessage>, ConfigError> {
    let mut reg = Registry::new();
    reg.register::<CmLogin>()?;
    reg.register::<CmEnter>()?;
    reg.register::<CmLeave>()?;
    reg.register::<CmChat>()?;
    reg.register::<CmCommandGm>()?;
    Ok(reg)
}

/// Builds the registry clients use to decode incoming server frames.
pub fn server_registry() -> Result<Registry<ServerMessage>, ConfigError> {
    let mut reg = Registry::new();
    reg.register::<SmRespLogin>()?;
    reg.register::<SmRespEnter>()?;
    reg.register::<SmRespLeave>()?;
    reg.register::<SmUserEnter>()?;
    reg.register::<SmUserLeave>()?;
    reg.register::<SmChatContent>()?;
    reg.register::<SmUserStats>()?;
    reg.register::<SmPopularWord>()?;
    Ok(reg)
}
