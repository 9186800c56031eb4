use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::IntelliClimaClient;
use crate::snapshot;
use crate::types::{DeviceIdentity, DeviceStatus, DisplayUnit, Temperature, ThermostatStatus};
use crate::Result;

/// Fixed reconciliation period. Every accessory runs its own timer; there
/// is no cross-accessory coordination.
pub const POLL_PERIOD: Duration = Duration::from_secs(5);

/// Services an accessory can expose to the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Thermostat,
    TemperatureSensor,
    HumiditySensor,
}

/// A single changed-characteristic notification. Temperatures are already
/// converted to the accessory's display unit; statuses carry the raw
/// normalized value.
#[derive(Debug, Clone, PartialEq)]
pub enum CharacteristicUpdate {
    CurrentHeatingCoolingState(ThermostatStatus),
    TargetHeatingCoolingState(ThermostatStatus),
    CurrentRelativeHumidity(f64),
    CurrentTemperature(f64),
    TargetTemperature(f64),
}

/// Host accessory-registration framework boundary. The accessory calls in
/// to register services and push changed values; the host calls back into
/// the accessory's get/set handlers when a controller reads or writes.
pub trait ServiceHub: Send + Sync {
    /// Register one service under an accessory. Called at most once per
    /// `(accessory, service)` pair; re-registration is deduplicated on the
    /// accessory side.
    fn register_service(&self, accessory_id: &str, service: ServiceKind, name: &str);

    /// Push a changed characteristic value to a registered service.
    fn update_characteristic(
        &self,
        accessory_id: &str,
        service: ServiceKind,
        update: CharacteristicUpdate,
    );
}

/// Per-device feature switches from the platform configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessoryFeatures {
    pub temperature_sensor: bool,
    pub humidity_sensor: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ServiceSet {
    thermostat: bool,
    temperature_sensor: bool,
    humidity_sensor: bool,
}

/// The five observable fields, remembered between reconciliation ticks.
/// Temperatures are kept in Celsius here; conversion happens only when a
/// notification is emitted.
#[derive(Debug, Clone, Copy)]
struct ObservedFields {
    status: ThermostatStatus,
    target_status: ThermostatStatus,
    humidity: f64,
    temperature: Temperature,
    target_temperature: Temperature,
}

impl ObservedFields {
    fn capture(status: &DeviceStatus) -> Self {
        Self {
            status: status.current_status,
            target_status: status.target_status,
            humidity: status.current_humidity,
            temperature: status.current_temperature,
            target_temperature: status.target_temperature,
        }
    }
}

struct Shared {
    identity: DeviceIdentity,
    features: AccessoryFeatures,
    client: Arc<IntelliClimaClient>,
    hub: Arc<dyn ServiceHub>,
    status: Mutex<DeviceStatus>,
    services: Mutex<ServiceSet>,
}

/// One thermostat accessory: identity, cached status, get/set handlers and
/// a periodic reconciliation loop that keeps the status fresh and notifies
/// the host of changed fields only.
pub struct ThermostatAccessory {
    shared: Arc<Shared>,
    poll_task: Option<JoinHandle<()>>,
}

/// Auto is presented to the outside world as a HEAT-equivalent "the system
/// may run"; the vendor cannot report Cool, so queries never answer it in
/// practice.
fn presented(status: ThermostatStatus) -> ThermostatStatus {
    match status {
        ThermostatStatus::Auto => ThermostatStatus::Heat,
        other => other,
    }
}

impl ThermostatAccessory {
    pub fn new(
        identity: DeviceIdentity,
        status: DeviceStatus,
        features: AccessoryFeatures,
        client: Arc<IntelliClimaClient>,
        hub: Arc<dyn ServiceHub>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                identity,
                features,
                client,
                hub,
                status: Mutex::new(status),
                services: Mutex::new(ServiceSet::default()),
            }),
            poll_task: None,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.shared.identity
    }

    pub fn status_snapshot(&self) -> DeviceStatus {
        self.shared.status().clone()
    }

    /// Fetch the latest vendor snapshot and overwrite all status fields
    /// atomically. Any failure is logged and the previous in-memory status
    /// stays untouched: a failed poll never corrupts state.
    pub async fn sync(&self) {
        self.shared.sync().await;
    }

    /// Register this accessory's services with the host framework and
    /// (re)start the reconciliation loop. Idempotent: already-registered
    /// services are reused, never duplicated.
    pub fn register(&mut self) {
        info!(accessory = %self.shared.identity.name, "initializing thermostat");
        {
            let identity = &self.shared.identity;
            let mut services = self.shared.services.lock().expect("services lock");
            if !services.thermostat {
                self.shared
                    .hub
                    .register_service(&identity.id, ServiceKind::Thermostat, &identity.name);
                services.thermostat = true;
            }
            if self.shared.features.temperature_sensor && !services.temperature_sensor {
                info!(accessory = %identity.name, "initializing temperature sensor");
                self.shared.hub.register_service(
                    &identity.id,
                    ServiceKind::TemperatureSensor,
                    &format!("{} Temperature Sensor", identity.name),
                );
                services.temperature_sensor = true;
            }
            if self.shared.features.humidity_sensor && !services.humidity_sensor {
                info!(accessory = %identity.name, "initializing humidity sensor");
                self.shared.hub.register_service(
                    &identity.id,
                    ServiceKind::HumiditySensor,
                    &format!("{} Humidity Sensor", identity.name),
                );
                services.humidity_sensor = true;
            }
        }
        self.subscribe_to_changes();
    }

    /// Start the periodic reconciliation task. A previous subscription for
    /// this accessory is cancelled first, so at most one task is ever live.
    /// The task runs until the process ends.
    pub fn subscribe_to_changes(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        let shared = Arc::clone(&self.shared);
        self.poll_task = Some(tokio::spawn(async move {
            let mut previous = ObservedFields::capture(&shared.status());
            let mut ticker = tokio::time::interval(POLL_PERIOD);
            // the immediate first fire of interval(); real ticks start one
            // period out, matching setInterval semantics
            ticker.tick().await;
            loop {
                ticker.tick().await;
                shared.reconcile_tick(&mut previous).await;
            }
        }));
    }

    pub fn handle_current_heating_cooling_state_get(&self) -> ThermostatStatus {
        debug!(accessory = %self.shared.identity.name, "GET CurrentHeatingCoolingState");
        presented(self.shared.status().current_status)
    }

    pub fn handle_target_heating_cooling_state_get(&self) -> ThermostatStatus {
        debug!(accessory = %self.shared.identity.name, "GET TargetHeatingCoolingState");
        presented(self.shared.status().target_status)
    }

    /// Delegates to the vendor write endpoint, sending the current target
    /// temperature alongside the new mode (the endpoint always wants both).
    pub async fn handle_target_heating_cooling_state_set(&self, value: ThermostatStatus) {
        debug!(accessory = %self.shared.identity.name, value = ?value, "SET TargetHeatingCoolingState");
        let target_temperature = self.handle_target_temperature_get();
        self.shared
            .client
            .change_mode(&self.shared.identity, value, target_temperature)
            .await;
    }

    pub fn handle_current_temperature_get(&self) -> f64 {
        debug!(accessory = %self.shared.identity.name, "GET CurrentTemperature");
        let status = self.shared.status();
        status.display_unit.present(status.current_temperature)
    }

    pub fn handle_current_relative_humidity_get(&self) -> f64 {
        debug!(accessory = %self.shared.identity.name, "GET CurrentRelativeHumidity");
        self.shared.status().current_humidity
    }

    pub fn handle_target_temperature_get(&self) -> f64 {
        debug!(accessory = %self.shared.identity.name, "GET TargetTemperature");
        let status = self.shared.status();
        status.display_unit.present(status.target_temperature)
    }

    /// Converts the externally supplied value from the display unit back to
    /// Celsius, then delegates with the currently exposed target state.
    pub async fn handle_target_temperature_set(&self, value: f64) {
        let celsius = {
            let status = self.shared.status();
            status.display_unit.absorb(value)
        };
        debug!(
            accessory = %self.shared.identity.name,
            celsius = celsius.celsius(),
            "SET TargetTemperature"
        );
        let target_status = self.handle_target_heating_cooling_state_get();
        self.shared
            .client
            .set_device_target_temperature(&self.shared.identity, target_status, celsius.celsius())
            .await;
    }

    pub fn handle_temperature_display_units_get(&self) -> DisplayUnit {
        debug!(accessory = %self.shared.identity.name, "GET TemperatureDisplayUnits");
        self.shared.status().display_unit
    }

    /// Flips the local display preference only; the vendor API is not
    /// contacted.
    pub fn handle_temperature_display_units_set(&self, value: DisplayUnit) {
        debug!(accessory = %self.shared.identity.name, value = ?value, "SET TemperatureDisplayUnits");
        self.shared.status().display_unit = value;
    }
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, DeviceStatus> {
        self.status.lock().expect("status lock poisoned")
    }

    async fn fetch_status(&self) -> Result<DeviceStatus> {
        let response = self.client.get_device(&self.identity.id).await?;
        snapshot::to_status(&response)
    }

    async fn sync(&self) {
        debug!(accessory = %self.identity.name, "syncing accessory");
        match self.fetch_status().await {
            Ok(fresh) => {
                let mut status = self.status();
                *status = fresh;
            }
            Err(e) => {
                error!(
                    accessory = %self.identity.name,
                    error = %e,
                    "sync failed, keeping previous status"
                );
            }
        }
    }

    /// One reconciliation tick: sync, then compare each observable field
    /// against the previous tick and notify only the ones that changed.
    async fn reconcile_tick(&self, previous: &mut ObservedFields) {
        self.sync().await;

        let (current, unit) = {
            let status = self.status();
            (ObservedFields::capture(&status), status.display_unit)
        };
        let services = *self.services.lock().expect("services lock");

        if current.status != previous.status {
            info!(
                accessory = %self.identity.name,
                from = ?previous.status,
                to = ?current.status,
                "updating CurrentHeatingCoolingState"
            );
            self.push(
                ServiceKind::Thermostat,
                CharacteristicUpdate::CurrentHeatingCoolingState(current.status),
            );
            previous.status = current.status;
        }
        if current.target_status != previous.target_status {
            info!(
                accessory = %self.identity.name,
                from = ?previous.target_status,
                to = ?current.target_status,
                "updating TargetHeatingCoolingState"
            );
            self.push(
                ServiceKind::Thermostat,
                CharacteristicUpdate::TargetHeatingCoolingState(current.target_status),
            );
            previous.target_status = current.target_status;
        }
        if current.humidity != previous.humidity {
            info!(
                accessory = %self.identity.name,
                from = previous.humidity,
                to = current.humidity,
                "updating CurrentRelativeHumidity"
            );
            self.push(
                ServiceKind::Thermostat,
                CharacteristicUpdate::CurrentRelativeHumidity(current.humidity),
            );
            if services.humidity_sensor {
                self.push(
                    ServiceKind::HumiditySensor,
                    CharacteristicUpdate::CurrentRelativeHumidity(current.humidity),
                );
            }
            previous.humidity = current.humidity;
        }
        if current.temperature != previous.temperature {
            let value = unit.present(current.temperature);
            info!(
                accessory = %self.identity.name,
                from = unit.present(previous.temperature),
                to = value,
                "updating CurrentTemperature"
            );
            self.push(
                ServiceKind::Thermostat,
                CharacteristicUpdate::CurrentTemperature(value),
            );
            if services.temperature_sensor {
                self.push(
                    ServiceKind::TemperatureSensor,
                    CharacteristicUpdate::CurrentTemperature(value),
                );
            }
            previous.temperature = current.temperature;
        }
        if current.target_temperature != previous.target_temperature {
            let value = unit.present(current.target_temperature);
            info!(
                accessory = %self.identity.name,
                from = unit.present(previous.target_temperature),
                to = value,
                "updating TargetTemperature"
            );
            self.push(
                ServiceKind::Thermostat,
                CharacteristicUpdate::TargetTemperature(value),
            );
            previous.target_temperature = current.target_temperature;
        }
    }

    fn push(&self, service: ServiceKind, update: CharacteristicUpdate) {
        self.hub.update_characteristic(&self.identity.id, service, update);
    }
}
