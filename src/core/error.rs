use thiserror::Error;

use crate::core::types::{EntityId, SlotId};

#[derive(Error, Debug)]
pub enum TrafficError {
    #[error("Employee not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Employee {0} is already in service")]
    AlreadyInService(EntityId),

    #[error("Unknown station slot: {0}")]
    UnknownSlot(SlotId),

    #[error("No session is running")]
    SessionNotRunning,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrafficError>;
