use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

/// Fixed vendor cloud endpoint for Fantini Cosmi IntelliClima.
pub const DEFAULT_BASE_URL: &str = "https://intelliclima.fantinicosmi.it";

/// Path prefix for the single-zone ("mono") API surface.
pub const DEFAULT_API_FOLDER: &str = "/server_v1_mono/api/";

/// The only hardware model exposing a write endpoint in the current vendor
/// API surface. Writes against anything else are rejected up front.
pub const WRITABLE_MODEL: &str = "C800WiFi";

/// The cloud expects the password pre-hashed in the login URL path.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Client-metadata body submitted alongside the login call. The cloud keys
/// sessions on the uppercase UUID.
pub fn login_body() -> Value {
    json!({
        "manufacturer": "Rust",
        "model": "intelliclima-rs",
        "platform": "IntelliClimaRust",
        "version": env!("CARGO_PKG_VERSION"),
        "serial": "unknown",
        "uuid": Uuid::new_v4().to_string().to_uppercase(),
        "language": "english",
    })
}

/// Body for the per-device sync query. The energy-counter (`includi_eco`)
/// and LED-status (`includi_ledot`) flags are always requested.
pub fn device_query_body(device_id: &str) -> Value {
    json!({
        "IDs": device_id,
        "ECOs": "",
        "includi_eco": true,
        "includi_ledot": true,
    })
}

/// Combined mode+setpoint write payload. The vendor write endpoint always
/// requires both fields even when only one logically changed.
pub fn write_body(serial: &str, mode: u8, target_temperature: f64) -> Value {
    json!({
        "serial": serial,
        "mode": mode,
        "w_Tset_Tman": target_temperature,
    })
}

/// Validate a device-query response and re-parse its string-encoded fields.
///
/// The cloud serializes each record's `model` and `config` fields as JSON
/// text inside the JSON response; both are decoded back into structured
/// objects so the translator can address nested fields.
pub fn parse_device_response(mut response: Value) -> Result<Value> {
    match response.get("status").and_then(|s| s.as_str()) {
        Some("OK") => {}
        Some(other) => return Err(Error::VendorStatus(other.to_string())),
        None => return Err(Error::Translation("response has no status field".to_string())),
    }

    let records = match response.get_mut("data") {
        Some(Value::Array(records)) => records,
        _ => return Err(Error::Translation("response has no data list".to_string())),
    };

    for record in records {
        for field in ["model", "config"] {
            if let Some(Value::String(encoded)) = record.get(field) {
                let decoded: Value = serde_json::from_str(encoded).map_err(|e| {
                    Error::Translation(format!("invalid embedded JSON in {field}: {e}"))
                })?;
                record[field] = decoded;
            }
        }
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn login_body_structure() {
        let body = login_body();
        assert_eq!(body["platform"], "IntelliClimaRust");
        assert_eq!(body["language"], "english");
        let uuid = body["uuid"].as_str().unwrap();
        assert_eq!(uuid, uuid.to_uppercase());
    }

    #[test]
    fn device_query_body_structure() {
        let body = device_query_body("42");
        assert_eq!(body["IDs"], "42");
        assert_eq!(body["ECOs"], "");
        assert_eq!(body["includi_eco"], true);
        assert_eq!(body["includi_ledot"], true);
    }

    #[test]
    fn write_body_structure() {
        let body = write_body("SN123", 1, 21.5);
        assert_eq!(body["serial"], "SN123");
        assert_eq!(body["mode"], 1);
        assert_eq!(body["w_Tset_Tman"], 21.5);
    }

    #[test]
    fn parse_device_response_decodes_embedded_json() {
        let response = json!({
            "status": "OK",
            "data": [{
                "id": "1",
                "model": r#"{"modello":"C800WiFi","tipo":"crono"}"#,
                "config": r#"{"mode":"2","serial":"SN123"}"#
            }]
        });
        let parsed = parse_device_response(response).unwrap();
        assert_eq!(parsed["data"][0]["model"]["modello"], "C800WiFi");
        assert_eq!(parsed["data"][0]["config"]["mode"], "2");
    }

    #[test]
    fn parse_device_response_rejects_non_ok() {
        let response = json!({"status": "NO_AUTH", "data": []});
        let err = parse_device_response(response).unwrap_err();
        assert!(matches!(err, Error::VendorStatus(s) if s == "NO_AUTH"));
    }

    #[test]
    fn parse_device_response_rejects_malformed_embedded_json() {
        let response = json!({
            "status": "OK",
            "data": [{"model": "not json", "config": "{}"}]
        });
        let err = parse_device_response(response).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn parse_device_response_passes_structured_fields_through() {
        // Some firmware revisions already return structured objects.
        let response = json!({
            "status": "OK",
            "data": [{"model": {"modello": "C800WiFi"}, "config": {"mode": "1"}}]
        });
        let parsed = parse_device_response(response).unwrap();
        assert_eq!(parsed["data"][0]["model"]["modello"], "C800WiFi");
    }
}
