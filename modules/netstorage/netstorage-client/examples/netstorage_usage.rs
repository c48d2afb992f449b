//! Usage example for the NetStorage client
//!
//! To run this example:
//! ```bash
//! export NETSTORAGE_HOSTNAME="example-nsu.akamaihd.net"
//! export NETSTORAGE_KEY_NAME="upload-user"
//! export NETSTORAGE_KEY="your-key-here"
//! export NETSTORAGE_SSL="true"
//! export NETSTORAGE_CP_CODE="123456"
//! RUST_LOG=netstorage_client=debug cargo run --example netstorage_usage
//! ```

use std::time::Duration;

use anyhow::Context;
use netstorage_client::{NetStorageClient, NetStorageConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = NetStorageConfig::from_env()?.with_timeout(Duration::from_secs(60));
    let cp_code = std::env::var("NETSTORAGE_CP_CODE").context("NETSTORAGE_CP_CODE not set")?;
    let client = NetStorageClient::from_config(config)?;

    let root = format!("/{cp_code}/netstorage-example");

    println!("=== mkdir ===");
    let outcome = client.mkdir(&root).await?;
    println!("Status: {}\n", outcome.status());

    println!("=== upload ===");
    let local = std::env::temp_dir().join("netstorage-example.txt");
    tokio::fs::write(&local, "hello from rust\n").await?;
    let outcome = client.upload(&local, &format!("{root}/")).await?;
    println!("Payload: {:?}\n", outcome.payload());

    println!("=== dir ===");
    let outcome = client.dir(&root).await?;
    println!(
        "Listing: {}\n",
        serde_json::to_string_pretty(&outcome.into_parts().1.into_value())?
    );

    println!("=== download ===");
    let target = std::env::temp_dir().join("netstorage-example-copy.txt");
    let outcome = client
        .download(&format!("{root}/netstorage-example.txt"), &target)
        .await?;
    println!("Payload: {:?} -> {}\n", outcome.payload(), target.display());

    println!("=== cleanup ===");
    client
        .delete(&format!("{root}/netstorage-example.txt"))
        .await?;
    client.rmdir(&root).await?;

    Ok(())
}
