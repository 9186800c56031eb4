use intelliclima::{DisplayUnit, Temperature, ThermostatStatus};
use serde_json::json;

#[test]
fn from_celsius() {
    let t = Temperature::from_celsius(25.0);
    assert_eq!(t.celsius(), 25.0);
    assert_eq!(t.fahrenheit(), 77.0);
}

#[test]
fn from_fahrenheit() {
    let t = Temperature::from_fahrenheit(77.0);
    assert_eq!(t.celsius(), 25.0);
    assert_eq!(t.fahrenheit(), 77.0);
}

#[test]
fn conversion_is_exact_linear() {
    let t = Temperature::from_celsius(22.0);
    assert!((t.fahrenheit() - 71.6).abs() < 1e-9);
    let back = Temperature::from_fahrenheit(t.fahrenheit());
    assert!((back.celsius() - 22.0).abs() < 1e-9);
}

#[test]
fn display() {
    let t = Temperature::from_celsius(21.5);
    assert_eq!(format!("{t}"), "21.5\u{00b0}C");
}

#[test]
fn display_unit_present_and_absorb() {
    let t = Temperature::from_celsius(25.0);
    assert_eq!(DisplayUnit::Celsius.present(t), 25.0);
    assert_eq!(DisplayUnit::Fahrenheit.present(t), 77.0);
    assert_eq!(DisplayUnit::Celsius.absorb(25.0).celsius(), 25.0);
    assert_eq!(DisplayUnit::Fahrenheit.absorb(77.0).celsius(), 25.0);
}

#[test]
fn vendor_mode_mapping() {
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
    assert_eq!(
        ThermostatStatus::from_vendor_mode(&json!("9")),
        ThermostatStatus::Off
    );
}

#[test]
fn vendor_mode_writes() {
    assert_eq!(ThermostatStatus::Off.to_vendor_mode(), 0);
    assert_eq!(ThermostatStatus::Heat.to_vendor_mode(), 1);
    assert_eq!(ThermostatStatus::Cool.to_vendor_mode(), 0);
    assert_eq!(ThermostatStatus::Auto.to_vendor_mode(), 2);
}

#[test]
fn reportable_modes_roundtrip() {
    for code in [0u8, 1, 2] {
        let status = ThermostatStatus::from_vendor_mode(&json!(code.to_string()));
        assert_eq!(status.to_vendor_mode(), code);
    }
}
