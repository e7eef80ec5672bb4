//! Server configuration from the process environment.
use std::env;
use std::path::PathBuf;

use arena_content::SessionConfig;

/// Overrides applied on top of `session.toml`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub tick_hz: Option<u32>,
    pub duration_secs: Option<u64>,
    pub seed: Option<u64>,
    pub mirrors: Option<usize>,
    /// Seconds after which the coordinator hands authority to the first
    /// mirror.
    pub handover_after_secs: Option<u64>,
    pub players: usize,
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ARENA_DATA_DIR` - Directory holding `session.toml`, `agents.ron` and `arenas/` (default: `data`)
    /// - `ARENA_TICK_HZ` - Simulation rate override
    /// - `ARENA_DURATION_SECS` - Run time override, zero runs until interrupted
    /// - `ARENA_SEED` - Session seed override
    /// - `ARENA_MIRRORS` - Number of mirror peers override
    /// - `ARENA_HANDOVER_SECS` - Move authority to the first mirror after this long
    /// - `ARENA_PLAYERS` - Scripted players to add (default: one per player start)
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("ARENA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            tick_hz: read_env("ARENA_TICK_HZ"),
            duration_secs: read_env("ARENA_DURATION_SECS"),
            seed: read_env("ARENA_SEED"),
            mirrors: read_env("ARENA_MIRRORS"),
            handover_after_secs: read_env("ARENA_HANDOVER_SECS"),
            players: read_env("ARENA_PLAYERS").unwrap_or(0),
        }
    }

    pub fn apply(&self, session: &mut SessionConfig) {
        if let Some(tick_hz) = self.tick_hz {
            session.session.tick_hz = tick_hz.max(1);
        }
        if let Some(duration) = self.duration_secs {
            session.session.duration_secs = duration;
        }
        if let Some(seed) = self.seed {
            session.session.seed = seed;
        }
        if let Some(mirrors) = self.mirrors {
            session.session.mirrors = mirrors;
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
