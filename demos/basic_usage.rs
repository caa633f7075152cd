//! Basic usage example for the key-value client
//!
//! Run with: KVDB_URL=<database-url> cargo run --example basic_usage

use kvdb_client::Client;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // Database URL from the command line or the KVDB_URL variable
    let client = match std::env::args().nth(1) {
        Some(url) => Client::new(&url)?,
        None => Client::from_env()?,
    };

    // Store a value
    info!("Storing key 'example:greeting'...");
    client.set("example:greeting", "Hello, KV store!").await?;

    // Retrieve the value
    info!("Retrieving key 'example:greeting'...");
    if let Some(value) = client.get("example:greeting").await? {
        info!("Retrieved: {:?}", value);
    } else {
        info!("Key not found");
    }

    // Store structured JSON data
    info!("Storing JSON data under 'example:user'...");
    client
        .set(
            "example:user",
            &serde_json::json!({"name": "Alice", "age": 30, "city": "NYC"}),
        )
        .await?;

    // List keys by prefix
    info!("Listing 'example:' keys...");
    for key in client.list("example:").await? {
        info!("  - {}", key);
    }

    // Fetch everything
    let all = client.get_all().await?;
    info!("{} keys in the store", all.len());

    // Clean up
    info!("Deleting example keys...");
    client
        .delete_many(&["example:greeting", "example:user"])
        .await?;

    info!("Example completed successfully!");
    Ok(())
}
