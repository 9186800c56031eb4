mod accessory;
mod client;
mod diff;
mod error;
mod logger;
mod platform;
mod protocol;
mod snapshot;
mod types;

pub use accessory::{
    AccessoryFeatures, CharacteristicUpdate, ServiceHub, ServiceKind, ThermostatAccessory,
    POLL_PERIOD,
};
pub use client::{IntelliClimaClient, IntelliClimaClientBuilder};
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use platform::{IntelliClimaPlatform, PlatformConfig};
pub use snapshot::{to_identity, to_status};
pub use types::*;
