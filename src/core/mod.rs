pub mod config;
pub mod error;
pub mod types;

pub use config::{GameConfig, PatienceConfig, Phase, RosterEntry, StationConfig};
pub use error::{Result, TrafficError};
pub use types::{EntityId, Generation, Location, SlotId, StationType};
