use std::fmt;

use serde_json::Value;

/// Temperature stored as Celsius internally.
/// Conversion is the exact linear map; callers round for display if needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature(f64);

impl Temperature {
    pub fn from_celsius(c: f64) -> Self {
        Self(c)
    }

    pub fn from_fahrenheit(f: f64) -> Self {
        Self((f - 32.0) / 1.8)
    }

    pub fn celsius(&self) -> f64 {
        self.0
    }

    pub fn fahrenheit(&self) -> f64 {
        self.0 * 1.8 + 32.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{00b0}C", self.0)
    }
}

/// Normalized accessory status vocabulary.
///
/// `Cool` is a reachable value for forward compatibility, but the vendor
/// mapping never produces it: IntelliClima only reports off/manual/auto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatStatus {
    Off,
    Heat,
    Cool,
    Auto,
}

impl ThermostatStatus {
    /// Map a vendor mode code to the normalized status.
    /// The cloud reports the code as a numeral string in `c_mode` but the
    /// `config.mode` override may arrive as a bare number, so both shapes
    /// are accepted. Unknown codes default to `Off` rather than erroring.
    pub fn from_vendor_mode(mode: &Value) -> Self {
        let code = match mode {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return ThermostatStatus::Off,
        };
        match code.as_str() {
            "0" => ThermostatStatus::Off,
            "1" => ThermostatStatus::Heat,
            "2" => ThermostatStatus::Auto,
            _ => ThermostatStatus::Off,
        }
    }

    /// Inverse mapping for writes. `Cool` is aliased to off because the
    /// vendor protocol has no cooling mode.
    pub fn to_vendor_mode(self) -> u8 {
        match self {
            ThermostatStatus::Off => 0,
            ThermostatStatus::Heat => 1,
            ThermostatStatus::Cool => 0,
            ThermostatStatus::Auto => 2,
        }
    }
}

/// Per-accessory display preference. Governs only the conversion at the
/// get/set handler boundary; all storage and diffing stay in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl DisplayUnit {
    /// Convert an internal temperature to this unit for presentation.
    pub fn present(&self, temperature: Temperature) -> f64 {
        match self {
            DisplayUnit::Celsius => temperature.celsius(),
            DisplayUnit::Fahrenheit => temperature.fahrenheit(),
        }
    }

    /// Convert an externally supplied value in this unit back to Celsius.
    pub fn absorb(&self, value: f64) -> Temperature {
        match self {
            DisplayUnit::Celsius => Temperature::from_celsius(value),
            DisplayUnit::Fahrenheit => Temperature::from_fahrenheit(value),
        }
    }
}

/// Static device identity, created once at discovery and never mutated.
/// Serves as the stable key for accessory registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
    pub model: String,
    pub serial_number: String,
}

/// Mutable per-device snapshot, overwritten in place by the sync loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub current_status: ThermostatStatus,
    pub target_status: ThermostatStatus,
    pub current_temperature: Temperature,
    pub target_temperature: Temperature,
    pub current_humidity: f64,
    pub display_unit: DisplayUnit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vendor_mode_string_codes() {
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!("0")),
            ThermostatStatus::Off
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!("1")),
            ThermostatStatus::Heat
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!("2")),
            ThermostatStatus::Auto
        );
    }

    #[test]
    fn vendor_mode_numeric_codes() {
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!(0)),
            ThermostatStatus::Off
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!(1)),
            ThermostatStatus::Heat
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!(2)),
            ThermostatStatus::Auto
        );
    }

    #[test]
    fn vendor_mode_unknown_defaults_to_off() {
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!("7")),
            ThermostatStatus::Off
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&json!("auto")),
            ThermostatStatus::Off
        );
        assert_eq!(
            ThermostatStatus::from_vendor_mode(&Value::Null),
            ThermostatStatus::Off
        );
    }

    #[test]
    fn vendor_mode_roundtrip() {
        for code in [0u8, 1, 2] {
            let status = ThermostatStatus::from_vendor_mode(&json!(code));
            assert_eq!(status.to_vendor_mode(), code);
        }
    }

    #[test]
    fn cool_aliases_to_off_on_write() {
        assert_eq!(ThermostatStatus::Cool.to_vendor_mode(), 0);
    }

    #[test]
    fn display_unit_defaults_to_celsius() {
        assert_eq!(DisplayUnit::default(), DisplayUnit::Celsius);
    }

    #[test]
    fn display_unit_boundary_conversion() {
        let t = Temperature::from_celsius(25.0);
        assert_eq!(DisplayUnit::Celsius.present(t), 25.0);
        assert_eq!(DisplayUnit::Fahrenheit.present(t), 77.0);
        assert_eq!(DisplayUnit::Fahrenheit.absorb(77.0).celsius(), 25.0);
    }
}
