//! `dfbridge serve` — Start the webhook server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🌉 dfbridge");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {} @ {}", config.model, config.base_url);
    println!(
        "   Auth:      {}",
        if config.gateway.webhook_secret.is_some() {
            "bearer secret required"
        } else {
            "open (no WEBHOOK_SECRET)"
        }
    );

    dfbridge_gateway::start(config).await?;

    Ok(())
}
