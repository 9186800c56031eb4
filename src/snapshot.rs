//! Translation from a raw vendor device-query response into the normalized
//! accessory vocabulary. The response must already have its string-encoded
//! `model`/`config` fields decoded (see `protocol::parse_device_response`).

use serde_json::Value;

use crate::types::{DeviceIdentity, DeviceStatus, DisplayUnit, Temperature, ThermostatStatus};
use crate::{Error, Result};

/// First device record of the query result. The query addresses exactly one
/// id, so an empty list is a translation failure.
fn record(response: &Value) -> Result<&Value> {
    response
        .pointer("/data/0")
        .ok_or_else(|| Error::Translation("device response has no records".to_string()))
}

fn string_field(record: &Value, key: &str) -> Result<String> {
    record
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Translation(format!("missing field: {key}")))
}

/// Numeric fields arrive string-typed ("20.5"), but tolerate bare numbers.
fn numeric_field(record: &Value, key: &str) -> Result<f64> {
    let value = record
        .get(key)
        .ok_or_else(|| Error::Translation(format!("missing field: {key}")))?;
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Translation(format!("non-finite number in {key}"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Translation(format!("unparseable number in {key}: {s:?}"))),
        _ => Err(Error::Translation(format!("unexpected type in {key}"))),
    }
}

/// Extract the immutable device identity from a device-query response.
pub fn to_identity(response: &Value) -> Result<DeviceIdentity> {
    let record = record(response)?;
    Ok(DeviceIdentity {
        id: string_field(record, "id")?,
        name: string_field(record, "name")?,
        model: record
            .pointer("/model/modello")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Translation("missing field: model.modello".to_string()))?,
        serial_number: string_field(record, "crono_sn")?,
    })
}

/// Translate a device-query response into a normalized status snapshot.
///
/// The target status comes from the `config.mode` override when present and
/// falls back to the reported `c_mode` otherwise: until the user issues a
/// change, target mirrors current. The display unit is always Celsius at
/// translation time; the preference is accessory-local state, not vendor
/// payload.
pub fn to_status(response: &Value) -> Result<DeviceStatus> {
    let record = record(response)?;
    let reported_mode = record.get("c_mode").cloned().unwrap_or(Value::Null);
    let target_mode = match record.pointer("/config/mode") {
        Some(Value::Null) | None => reported_mode.clone(),
        Some(configured) => configured.clone(),
    };
    Ok(DeviceStatus {
        current_status: ThermostatStatus::from_vendor_mode(&reported_mode),
        target_status: ThermostatStatus::from_vendor_mode(&target_mode),
        current_temperature: Temperature::from_celsius(numeric_field(record, "t_amb")?),
        target_temperature: Temperature::from_celsius(numeric_field(record, "tmanw")?),
        current_humidity: numeric_field(record, "rh")?,
        display_unit: DisplayUnit::Celsius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(c_mode: &str, config_mode: Option<&str>) -> Value {
        let mut config = json!({"serial": "SN123"});
        if let Some(mode) = config_mode {
            config["mode"] = json!(mode);
        }
        json!({
            "status": "OK",
            "data": [{
                "id": "17",
                "name": "Living Room",
                "crono_sn": "SN123",
                "model": {"modello": "C800WiFi", "tipo": "crono"},
                "config": config,
                "c_mode": c_mode,
                "t_amb": "20.5",
                "tmanw": "21.0",
                "rh": "45"
            }]
        })
    }

    #[test]
    fn identity_from_nested_fields() {
        let identity = to_identity(&response("1", None)).unwrap();
        assert_eq!(identity.id, "17");
        assert_eq!(identity.name, "Living Room");
        assert_eq!(identity.model, "C800WiFi");
        assert_eq!(identity.serial_number, "SN123");
    }

    #[test]
    fn status_parses_string_typed_numerics() {
        let status = to_status(&response("1", None)).unwrap();
        assert_eq!(status.current_temperature.celsius(), 20.5);
        assert_eq!(status.target_temperature.celsius(), 21.0);
        assert_eq!(status.current_humidity, 45.0);
        assert_eq!(status.display_unit, DisplayUnit::Celsius);
    }

    #[test]
    fn target_falls_back_to_reported_mode() {
        let status = to_status(&response("1", None)).unwrap();
        assert_eq!(status.current_status, ThermostatStatus::Heat);
        assert_eq!(status.target_status, ThermostatStatus::Heat);
    }

    #[test]
    fn configured_mode_overrides_target() {
        let status = to_status(&response("1", Some("2"))).unwrap();
        assert_eq!(status.current_status, ThermostatStatus::Heat);
        assert_eq!(status.target_status, ThermostatStatus::Auto);
    }

    #[test]
    fn null_configured_mode_falls_back() {
        let mut resp = response("2", None);
        resp["data"][0]["config"]["mode"] = Value::Null;
        let status = to_status(&resp).unwrap();
        assert_eq!(status.target_status, ThermostatStatus::Auto);
    }

    #[test]
    fn empty_record_list_is_translation_failure() {
        let empty = json!({"status": "OK", "data": []});
        assert!(matches!(to_identity(&empty), Err(Error::Translation(_))));
        assert!(matches!(to_status(&empty), Err(Error::Translation(_))));
    }

    #[test]
    fn unparseable_temperature_is_translation_failure() {
        let mut resp = response("1", None);
        resp["data"][0]["t_amb"] = json!("--");
        assert!(matches!(to_status(&resp), Err(Error::Translation(_))));
    }
}
