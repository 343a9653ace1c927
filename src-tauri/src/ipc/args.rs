//! Positional argument decoding for IPC commands.

use super::Command;
use crate::error::{BridgeError, BridgeResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct Args<'a> {
    command: Command,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(command: Command, values: &'a [Value]) -> Self {
        Self { command, values }
    }

    /// Raw value at `index`; `null` counts as absent.
    pub fn raw(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    pub fn required<T: DeserializeOwned>(&self, index: usize) -> BridgeResult<T> {
        self.optional(index)?.ok_or(BridgeError::MissingArgument {
            command: self.command.as_str(),
            index,
        })
    }

    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> BridgeResult<Option<T>> {
        match self.raw(index) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| BridgeError::InvalidArgument {
                    command: self.command.as_str(),
                    index,
                    source,
                }),
        }
    }
}
