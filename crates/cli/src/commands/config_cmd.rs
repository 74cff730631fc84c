//! `dfbridge config` — Print the effective configuration.

use std::path::Path;

use dfbridge_config::AppConfig;

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let source = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    println!("# source: {} (+ environment)", source.display());
    print!("{}", config.to_redacted_toml());

    Ok(())
}
