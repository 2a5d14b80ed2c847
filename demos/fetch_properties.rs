//! Example fetching properties from a running configuration server.
//!
//! Point it at a server with `CONFIG_SERVER_HOST` / `CONFIG_SERVER_PORT`
//! (defaults to `localhost:8888`) and run:
//!
//! ```text
//! RUST_LOG=info cargo run --example fetch_properties -- myapp prod
//! ```

use config_server_client::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let application = args.next().unwrap_or_else(|| "myapp".to_string());
    let environment = args.next().unwrap_or_else(|| "dev".to_string());

    let settings = ClientSettings::from_env()?;
    println!("=== Config Server Client Example ===\n");
    println!("Server:      {}:{}", settings.host, settings.port);
    println!("Application: {}", application);
    println!("Environment: {}", environment);
    println!();

    let client = ConfigServerClient::from_settings(&settings)?;
    let store = PropertyStore::new();
    let report = client
        .fetch_properties(&application, &environment, &store)
        .await?;

    for source in &report.applied {
        println!(
            "✓ {:<17} {} ({} keys, index {})",
            source.category, source.name, source.keys, source.index
        );
    }
    for category in &report.missing {
        println!("✗ {:<17} no matching property source", category);
    }
    println!();

    for key in store.keys() {
        if let Some(value) = store.get(&key) {
            println!("  {} = {}", key, value);
        }
    }

    Ok(())
}
