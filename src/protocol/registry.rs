//! Static decode table. Each concrete [`WireMessage`] is registered once by
//! name; decoding returns the tagged enum `Out`, and every call site
//! dispatches with a `match` on that enum rather than consulting the
//! registry again.

use std::collections::HashMap;

use crate::error::{ConfigError, WireError};
use crate::protocol::messages::WireMessage;

type DecodeFn<Out> = Box<dyn Fn(&[u8]) -> Result<Out, WireError> + Send + Sync>;

pub struct Registry<Out> {
    decoders: HashMap<&'static str, DecodeFn<Out>>,
}

impl<Out: 'static> Registry<Out> {
    pub fn new() -> Self {
        Registry {
            decoders: HashMap::new(),
        }
    }

    /// Registers `T` under its wire name. Registering the same name twice
    /// is a fatal configuration error, matching the source's duplicate-type
    /// panic.
    pub fn register<T>(&mut self) -> Result<(), ConfigError>
    where
        T: WireMessage + Into<Out> + 'static,
    {
        if self.decoders.contains_key(T::NAME) {
            return Err(ConfigError::DuplicateRegistration(T::NAME.to_string()));
        }
        self.decoders.insert(
            T::NAME,
            Box::new(|body: &[u8]| {
                let value: T = bincode::deserialize(body).map_err(|source| WireError::Decode {
                    name: T::NAME.to_string(),
                    source,
                })?;
                Ok(value.into())
            }),
        );
        Ok(())
    }

    pub fn decode(&self, name: &str, body: &[u8]) -> Result<Out, WireError> {
        let decode = self
            .decoders
            .get(name)
            .ok_or_else(|| WireError::UnknownType(name.to_string()))?;
        decode(body)
    }
}

impl<Out: 'static> Default for Registry<Out> {
    fn default() -> Self {
        Self::new()
    }
}
