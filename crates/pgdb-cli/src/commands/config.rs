use crate::config::{CliConfig, default_path};

pub fn set(key: &str, value: &str) -> anyhow::Result<()> {
    let mut config = CliConfig::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("✓ Set {key}={value}");
    Ok(())
}

pub fn get() -> anyhow::Result<()> {
    let config = CliConfig::load()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn path() -> anyhow::Result<()> {
    println!("{}", default_path()?.display());
    Ok(())
}
