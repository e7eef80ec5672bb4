//! Session configuration loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::session::SessionConfig;

/// Loader for session configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load session configuration from a TOML file.
    pub fn load(path: &Path) -> LoadResult<SessionConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SessionConfig> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse session TOML: {}", e))?;

        if config.session.tick_hz == 0 {
            anyhow::bail!("session.tick_hz must be positive");
        }
        if config.bus.capacity == 0 || config.bus.command_buffer == 0 {
            anyhow::bail!("bus.capacity and bus.command_buffer must be positive");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            [session]
            tick_hz = 30

            [spawner]
            elite_chance = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.session.tick_hz, 30);
        assert_eq!(config.spawner.elite_chance, 0.5);
        assert_eq!(config.bus, SessionConfig::default().bus);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(ConfigLoader::parse("[session]\ntick_hz = 0\n").is_err());
    }
}
