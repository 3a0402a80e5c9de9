//! dnswitch - switch DNS resolvers safely
//!
//! Manage resolvers, domain overrides and connectivity probes from the terminal.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dnswitch_cli::run().await
}
