use intelliclima::{to_identity, to_status, IntelliClimaClient, MessageLogMode, POLL_PERIOD};
use std::env;

#[tokio::main]
async fn main() -> intelliclima::Result<()> {
    tracing_subscriber::fmt::init();

    let username = env::var("INTELLICLIMA_USERNAME")
        .expect("usage: INTELLICLIMA_USERNAME=... INTELLICLIMA_PASSWORD=... monitor [--wire-log]");
    let password = env::var("INTELLICLIMA_PASSWORD").expect("INTELLICLIMA_PASSWORD not set");
    let wire_log = env::args().any(|a| a == "--wire-log");

    let mut builder = IntelliClimaClient::builder(&username, &password);
    if wire_log {
        builder = builder.message_log(MessageLogMode::Diffed, "intelliclima-wire.ndjson");
    }
    let mut client = builder.build();

    println!("Logging in as {username}...");
    client.login().await;
    if !client.is_authenticated() {
        eprintln!("Login failed, check credentials.");
        std::process::exit(1);
    }
    println!(
        "Found {} device(s) in house {}. Polling for updates...",
        client.device_ids().len(),
        client.house_id().unwrap_or("?"),
    );

    let mut ticker = tokio::time::interval(POLL_PERIOD);
    loop {
        ticker.tick().await;
        for device in client.get_devices().await {
            match (to_identity(&device), to_status(&device)) {
                (Ok(identity), Ok(status)) => {
                    println!(
                        "[{}] {:.1}\u{00b0}C / {:.1}\u{00b0}F | target: {:.1}\u{00b0}C | mode: {:?} -> {:?} | humidity: {:.0}%",
                        identity.name,
                        status.current_temperature.celsius(),
                        status.current_temperature.fahrenheit(),
                        status.target_temperature.celsius(),
                        status.current_status,
                        status.target_status,
                        status.current_humidity,
                    );
                }
                (Err(e), _) | (_, Err(e)) => eprintln!("Translate error: {e}"),
            }
        }
    }
}
