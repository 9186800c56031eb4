use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol;
use crate::types::{DeviceIdentity, ThermostatStatus};
use crate::{Error, Result};

const DEVICE_SYNC_PATH: &str = "sync/cronos380";
const WRITE_PATH: &str = "C800/scrivi/";

/// Cloud session state. Created by `login`, never refreshed: an auth
/// failure leaves the session unauthenticated and every later call fails
/// softly with an empty result.
#[derive(Default)]
struct Session {
    auth_token: Option<String>,
    user_id: Option<String>,
    house_id: Option<String>,
    device_ids: Vec<String>,
}

pub struct IntelliClimaClientBuilder {
    username: String,
    password: String,
    base_url: String,
    api_folder: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl IntelliClimaClientBuilder {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: protocol::DEFAULT_BASE_URL.to_string(),
            api_folder: protocol::DEFAULT_API_FOLDER.to_string(),
            log_mode: None,
            log_path: None,
        }
    }

    /// Override the vendor endpoint. Used by tests against a mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_folder(mut self, folder: impl Into<String>) -> Self {
        self.api_folder = folder.into();
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> IntelliClimaClient {
        let http = reqwest::Client::builder()
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(
                MessageLogger::new(mode, &path).expect("failed to open log file"),
            )),
            _ => None,
        };

        IntelliClimaClient {
            http,
            username: self.username,
            password: self.password,
            base_url: self.base_url,
            api_folder: self.api_folder,
            session: Session::default(),
            logger,
        }
    }
}

/// API consumer for the IntelliClima cloud. Owns one `Session`.
pub struct IntelliClimaClient {
    http: reqwest::Client,
    username: String,
    password: String,
    base_url: String,
    api_folder: String,
    session: Session,
    logger: Option<Mutex<MessageLogger>>,
}

impl IntelliClimaClient {
    pub fn builder(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> IntelliClimaClientBuilder {
        IntelliClimaClientBuilder::new(username, password)
    }

    /// Authenticate against the cloud and discover the first house's device
    /// ids. Fails open: any error is logged and the session simply stays
    /// unauthenticated, so discovery later yields zero devices. No retry.
    pub async fn login(&mut self) {
        if let Err(e) = self.try_login().await {
            error!(username = %self.username, error = %e, "login failed");
        }
    }

    async fn try_login(&mut self) -> Result<()> {
        let hashed = protocol::hash_password(&self.password);
        let path = format!("user/login/{}/{hashed}", self.username);
        let body = protocol::login_body();
        info!(username = %self.username, "logging in to IntelliClima");
        self.log_request("POST", &path, Some(&body));

        let response = self.post_json(&path, Some(&body), false).await?;
        if response.get("status").and_then(|v| v.as_str()) != Some("OK") {
            debug!(response = %response);
            return Err(Error::InvalidCredentials(self.username.clone()));
        }

        self.session.auth_token = response
            .get("token")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        self.session.user_id = response
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        self.load_house_and_devices().await
    }

    /// Best-effort bulk fetch over the session's device-id list. Skips
    /// non-positive ids and drops (logs, does not abort) any device whose
    /// individual fetch failed.
    pub async fn get_devices(&self) -> Vec<Value> {
        let mut devices = Vec::new();
        for device_id in &self.session.device_ids {
            if is_non_positive_id(device_id) {
                continue;
            }
            match self.get_device(device_id).await {
                Ok(device) => devices.push(device),
                Err(e) => {
                    error!(device = %device_id, error = %e, "failed to fetch device");
                }
            }
        }
        devices
    }

    /// Fetch one device record, including the auxiliary energy-counter and
    /// LED-status flags, with the string-encoded `model`/`config` fields
    /// decoded. No retry; failure propagates to the caller.
    pub async fn get_device(&self, device_id: &str) -> Result<Value> {
        let body = protocol::device_query_body(device_id);
        debug!(device = %device_id, "querying device");
        self.log_request("POST", DEVICE_SYNC_PATH, Some(&body));
        let response = self.post_json(DEVICE_SYNC_PATH, Some(&body), false).await?;
        let parsed = protocol::parse_device_response(response)?;
        self.log_device(device_id, &parsed);
        Ok(parsed)
    }

    /// Submit a new target setpoint. The vendor write endpoint always wants
    /// the combined mode+setpoint payload, so the caller supplies the target
    /// status it currently exposes. `temperature` is forwarded as given.
    pub async fn set_device_target_temperature(
        &self,
        identity: &DeviceIdentity,
        target_status: ThermostatStatus,
        temperature: f64,
    ) {
        if self.reject_unsupported_model(identity) {
            return;
        }
        info!(device = %identity.name, temperature, "changing target temperature");
        let body = protocol::write_body(
            &identity.serial_number,
            target_status.to_vendor_mode(),
            temperature,
        );
        self.submit_write("set_target_temperature", identity, body)
            .await;
    }

    /// Submit a mode change, carrying the caller's current target setpoint
    /// alongside it in the combined write payload.
    pub async fn change_mode(
        &self,
        identity: &DeviceIdentity,
        mode: ThermostatStatus,
        target_temperature: f64,
    ) {
        if self.reject_unsupported_model(identity) {
            return;
        }
        info!(device = %identity.name, mode = ?mode, "changing mode");
        let body = protocol::write_body(
            &identity.serial_number,
            mode.to_vendor_mode(),
            target_temperature,
        );
        self.submit_write("change_mode", identity, body).await;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.auth_token.is_some()
    }

    pub fn house_id(&self) -> Option<&str> {
        self.session.house_id.as_deref()
    }

    pub fn device_ids(&self) -> &[String] {
        &self.session.device_ids
    }

    async fn load_house_and_devices(&mut self) -> Result<()> {
        let Some(user_id) = self.session.user_id.clone() else {
            return Err(Error::NotAuthenticated);
        };
        let path = format!("casa/elenco2/{user_id}");
        info!(user = %user_id, "loading IntelliClima houses");
        self.log_request("POST", &path, None);

        let response = self.post_json(&path, None, true).await?;
        let Some(houses) = response.get("houses").and_then(|v| v.as_object()) else {
            return Err(Error::Translation(
                "houses response has no houses object".to_string(),
            ));
        };
        let Some((house_id, house_devices)) = houses.iter().next() else {
            return Err(Error::Translation("user has no houses".to_string()));
        };

        self.session.house_id = Some(house_id.clone());
        self.session.device_ids = house_devices
            .as_array()
            .map(|devices| {
                devices
                    .iter()
                    .filter_map(|d| d.get("id").and_then(|v| v.as_str()).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        debug!(
            house = %house_id,
            devices = self.session.device_ids.len(),
            "discovered house devices"
        );
        Ok(())
    }

    // Only the C800WiFi exposes a write endpoint in the current vendor API
    // surface; other models have different, unmapped write paths.
    fn reject_unsupported_model(&self, identity: &DeviceIdentity) -> bool {
        if identity.model == protocol::WRITABLE_MODEL {
            return false;
        }
        let e = Error::UnsupportedModel(identity.model.clone());
        error!(device = %identity.name, error = %e, "ignoring write");
        true
    }

    async fn submit_write(&self, action: &str, identity: &DeviceIdentity, body: Value) {
        self.log_command(action, &identity.serial_number, &body);
        if let Err(e) = self.post_json(WRITE_PATH, Some(&body), false).await {
            error!(device = %identity.name, action, error = %e, "write request failed");
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: Option<&Value>,
        with_session_headers: bool,
    ) -> Result<Value> {
        let url = format!("{}{}{path}", self.base_url, self.api_folder);
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if with_session_headers
            && let (Some(user_id), Some(token)) =
                (&self.session.user_id, &self.session.auth_token)
        {
            request = request.header("Tokenid", user_id).header("Token", token);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    fn log_request(&self, method: &str, path: &str, body: Option<&Value>) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_request(method, path, body);
        }
    }

    fn log_command(&self, action: &str, serial: &str, body: &Value) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_command(action, serial, body);
        }
    }

    fn log_device(&self, device_id: &str, body: &Value) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_device(device_id, body);
        }
    }
}

/// The house listing pads short device lists with placeholder ids ("0",
/// "-1"); those are never fetchable. Non-numeric ids pass through and fail
/// at fetch time instead.
fn is_non_positive_id(id: &str) -> bool {
    matches!(id.trim().parse::<i64>(), Ok(n) if n <= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_skipped() {
        assert!(is_non_positive_id("0"));
        assert!(is_non_positive_id("-3"));
        assert!(is_non_positive_id(" 0 "));
    }

    #[test]
    fn real_and_unparseable_ids_are_kept() {
        assert!(!is_non_positive_id("17"));
        assert!(!is_non_positive_id("abc"));
    }
}
