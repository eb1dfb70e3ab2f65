use anyhow::Result;
use std::path::PathBuf;

/// Writes the JSON schema for `config.toml` to the given path
/// (default: `config.schema.json`).
fn main() -> Result<()> {
    let out_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.schema.json"));
    reel_core::config::schema::write_config_schema(&out_path)?;
    Ok(())
}
