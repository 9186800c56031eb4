use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

/// How vendor API traffic is written to the NDJSON wire log.
pub enum MessageLogMode {
    /// Every device response is logged in full.
    Full,
    /// The first response per device is logged in full, later ones as a
    /// list of changed paths.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_devices: HashMap<String, Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_devices: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, action: &str, serial: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "serial": serial,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_device(&mut self, device_id: &str, body: &Value) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "device",
                    "id": device_id,
                    "body": body,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => {
                match self.previous_devices.get(device_id) {
                    None => {
                        let entry = json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "device",
                            "id": device_id,
                            "full": true,
                            "body": body,
                        });
                        self.write_line(&entry);
                    }
                    Some(previous) => {
                        let changes: Vec<Value> = diff_json(previous, body)
                            .into_iter()
                            .map(|c| json!({"path": c.path, "old": c.old, "new": c.new}))
                            .collect();
                        let entry = json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "device",
                            "id": device_id,
                            "changes": changes,
                        });
                        self.write_line(&entry);
                    }
                }
                self.previous_devices
                    .insert(device_id.to_string(), body.clone());
            }
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
