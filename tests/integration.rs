use intelliclima::{to_identity, to_status, IntelliClimaClient};

/// Run with: cargo test --test integration -- --ignored
/// Requires a real IntelliClima account:
///   INTELLICLIMA_USERNAME=... INTELLICLIMA_PASSWORD=... cargo test --test integration -- --ignored
#[tokio::test]
#[ignore]
async fn login_and_read_devices() {
    let username = std::env::var("INTELLICLIMA_USERNAME").expect("INTELLICLIMA_USERNAME not set");
    let password = std::env::var("INTELLICLIMA_PASSWORD").expect("INTELLICLIMA_PASSWORD not set");

    let mut client = IntelliClimaClient::builder(username, password).build();
    client.login().await;
    assert!(client.is_authenticated(), "login failed");
    assert!(
        !client.device_ids().is_empty(),
        "account should have at least one device"
    );

    let devices = client.get_devices().await;
    assert!(!devices.is_empty(), "should fetch at least one device");

    for device in &devices {
        let identity = to_identity(device).expect("identity should translate");
        let status = to_status(device).expect("status should translate");
        println!(
            "[{} / {}] {} at {} targeting {} ({:?} -> {:?})",
            identity.model,
            identity.serial_number,
            identity.name,
            status.current_temperature,
            status.target_temperature,
            status.current_status,
            status.target_status,
        );
    }
}
