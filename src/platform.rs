use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::accessory::{AccessoryFeatures, ServiceHub, ThermostatAccessory};
use crate::client::IntelliClimaClient;
use crate::{protocol, snapshot};

/// Platform-level configuration, deserialized from the host's JSON config
/// block. Sensor switches default to off; credentials are optional so a
/// half-configured install degrades to a disabled platform instead of
/// crashing the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub temperature_sensor: bool,
    pub humidity_sensor: bool,
    /// Override the vendor endpoint, for debugging against a staging server.
    pub api_url: Option<String>,
}

/// Top-level orchestrator: owns the configuration and the host hub, restores
/// cached accessories and runs device discovery.
pub struct IntelliClimaPlatform {
    config: PlatformConfig,
    hub: Arc<dyn ServiceHub>,
    restored: HashSet<String>,
}

impl IntelliClimaPlatform {
    pub fn new(config: PlatformConfig, hub: Arc<dyn ServiceHub>) -> Self {
        Self {
            config,
            hub,
            restored: HashSet::new(),
        }
    }

    /// Host callback for accessories cached from a previous run. Remembered
    /// so discovery can tell a restore from a first appearance.
    pub fn restore_accessory(&mut self, id: impl Into<String>) {
        let id = id.into();
        info!(accessory = %id, "loading accessory from cache");
        self.restored.insert(id);
    }

    /// Log in, enumerate the account's devices and build one registered
    /// accessory per supported thermostat. Unsupported models and devices
    /// whose snapshot cannot be translated are skipped with a log entry.
    pub async fn discover_devices(&mut self) -> Vec<ThermostatAccessory> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            warn!("username and password not configured, platform disabled");
            return Vec::new();
        };

        let mut builder = IntelliClimaClient::builder(username, password);
        if let Some(url) = &self.config.api_url {
            builder = builder.base_url(url);
        }
        let mut client = builder.build();
        client.login().await;
        let client = Arc::new(client);

        let features = AccessoryFeatures {
            temperature_sensor: self.config.temperature_sensor,
            humidity_sensor: self.config.humidity_sensor,
        };

        let mut accessories = Vec::new();
        for device in client.get_devices().await {
            let identity = match snapshot::to_identity(&device) {
                Ok(identity) => identity,
                Err(e) => {
                    error!(error = %e, "skipping device with untranslatable identity");
                    continue;
                }
            };
            if identity.model != protocol::WRITABLE_MODEL {
                warn!(
                    device = %identity.name,
                    model = %identity.model,
                    "skipping unsupported model"
                );
                continue;
            }
            let status = match snapshot::to_status(&device) {
                Ok(status) => status,
                Err(e) => {
                    error!(device = %identity.name, error = %e, "skipping device with untranslatable status");
                    continue;
                }
            };

            if self.restored.contains(&identity.id) {
                info!(device = %identity.name, "restoring existing accessory");
            } else {
                info!(device = %identity.name, "adding new accessory");
            }

            let mut accessory = ThermostatAccessory::new(
                identity,
                status,
                features,
                Arc::clone(&client),
                Arc::clone(&self.hub),
            );
            accessory.register();
            accessories.push(accessory);
        }
        accessories
    }
}
