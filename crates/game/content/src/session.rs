//! Session configuration.
//!
//! Loaded from `session.toml`. Every section and field may be omitted and
//! falls back to the defaults below.
use arena_core::SpawnerConfig;

use crate::layout::ArenaLayout;

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    pub session: SessionSection,
    pub bus: BusSection,
    pub pathing: PathingSection,
    pub spawner: SpawnerSection,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionSection {
    /// Simulation ticks per second.
    pub tick_hz: u32,
    /// Base seed for every deterministic roll in the session.
    pub seed: u64,
    /// Mirror peers started next to the coordinator.
    pub mirrors: usize,
    /// How long the headless server runs. Zero runs until interrupted.
    pub duration_secs: u64,
    /// Layout file under `arenas/`, without extension.
    pub arena: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            seed: 0x5eed_a4e4,
            mirrors: 1,
            duration_secs: 30,
            arena: "courtyard".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusSection {
    /// Frames buffered per subscriber before it starts lagging.
    pub capacity: usize,
    /// Commands buffered per peer handle.
    pub command_buffer: usize,
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            capacity: 1024,
            command_buffer: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathingSection {
    pub timeout_ms: u64,
    /// Attempts after the first one.
    pub retries: u32,
    /// Delay before retry `n` is `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for PathingSection {
    fn default() -> Self {
        Self {
            timeout_ms: 250,
            retries: 2,
            backoff_ms: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnerSection {
    pub enabled: bool,
    pub max_alive: usize,
    pub respawn_interval: f32,
    pub elite_chance: f32,
    /// Template keys; empty means every loaded template.
    pub templates: Vec<String>,
}

impl Default for SpawnerSection {
    fn default() -> Self {
        let defaults = SpawnerConfig::default();
        Self {
            enabled: true,
            max_alive: defaults.max_alive,
            respawn_interval: defaults.respawn_interval,
            elite_chance: defaults.elite_chance,
            templates: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Spawner settings for `layout`, or `None` when spawning is disabled.
    ///
    /// `known_templates` fills the template pool when the section names none.
    pub fn spawner_config<'a>(
        &self,
        layout: &ArenaLayout,
        known_templates: impl IntoIterator<Item = &'a str>,
    ) -> Option<SpawnerConfig> {
        if !self.spawner.enabled {
            return None;
        }
        let templates = if self.spawner.templates.is_empty() {
            let mut all: Vec<String> = known_templates.into_iter().map(str::to_string).collect();
            all.sort();
            all
        } else {
            self.spawner.templates.clone()
        };

        Some(SpawnerConfig {
            max_alive: self.spawner.max_alive,
            respawn_interval: self.spawner.respawn_interval,
            elite_chance: self.spawner.elite_chance.clamp(0.0, 1.0),
            spawn_points: layout.spawn_points(),
            templates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawner_falls_back_to_every_template() {
        let layout = ArenaLayout {
            name: "t".into(),
            cell_size: 1.0,
            rows: vec!["...".into()],
            spawn_points: vec![(0.5, 0.5)],
            player_starts: Vec::new(),
        };
        let config = SessionConfig::default();

        let spawner = config
            .spawner_config(&layout, ["runner", "brute"])
            .unwrap();

        assert_eq!(spawner.templates, vec!["brute".to_string(), "runner".to_string()]);
        assert_eq!(spawner.spawn_points.len(), 1);
    }

    #[test]
    fn disabled_spawner_yields_nothing() {
        let mut config = SessionConfig::default();
        config.spawner.enabled = false;
        let layout = ArenaLayout {
            name: "t".into(),
            cell_size: 1.0,
            rows: vec![".".into()],
            spawn_points: Vec::new(),
            player_starts: Vec::new(),
        };

        assert!(config.spawner_config(&layout, ["grunt"]).is_none());
    }
}
