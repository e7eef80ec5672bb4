#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arena_content::ArenaLayout;
use arena_core::{AgentConfig, EntityId, SessionRole};
use arena_runtime::{
    ChatSink, OracleManager, PeerId, PlayerDirectory, ReplicationBus, Runtime, RuntimeConfig,
    Services, TokioCleanup,
};

pub const PLAYER: EntityId = EntityId(1);

/// Open 16x12 floor ringed by walls.
pub fn layout() -> ArenaLayout {
    let mut rows = vec!["#".repeat(16)];
    rows.extend((0..10).map(|_| format!("#{}#", ".".repeat(14))));
    rows.push("#".repeat(16));
    ArenaLayout {
        name: "test".into(),
        cell_size: 1.0,
        rows,
        spawn_points: vec![(3.5, 3.5)],
        player_starts: vec![(8.5, 6.5)],
    }
}

/// Grunts that stand still unless they chase.
pub fn templates() -> Vec<(String, AgentConfig)> {
    vec![(
        "grunt".to_string(),
        AgentConfig {
            display_name: "Grunt".into(),
            min_roam_distance: 0.0,
            max_roam_distance: 0.0,
            hit_knockback_power: 0.0,
            ..AgentConfig::default()
        },
    )]
}

#[derive(Default)]
pub struct RecordingChat {
    messages: Mutex<Vec<String>>,
}

impl RecordingChat {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ChatSink for RecordingChat {
    fn announce(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Everything instances of one session share.
pub struct Session {
    pub bus: ReplicationBus,
    pub players: Arc<PlayerDirectory>,
    pub chat: Arc<RecordingChat>,
    pub cleanup: TokioCleanup,
}

impl Session {
    pub fn new() -> Self {
        Self::with_bus_capacity(256)
    }

    pub fn with_bus_capacity(capacity: usize) -> Self {
        Self {
            bus: ReplicationBus::with_capacity(capacity),
            players: Arc::new(PlayerDirectory::new()),
            chat: Arc::new(RecordingChat::default()),
            cleanup: TokioCleanup::new(),
        }
    }

    pub async fn start(&self, peer: u32, role: SessionRole) -> Runtime {
        let config = RuntimeConfig {
            session_seed: 0x5eed,
            ..RuntimeConfig::default()
        };
        let oracles =
            OracleManager::for_arena(layout(), self.players.clone(), config.session_seed, config.pathing);
        let services = Services {
            chat: self.chat.clone(),
            cleanup: Arc::new(self.cleanup.clone()),
            presentation: None,
            cleanup_delay: Duration::from_secs(3),
        };

        Runtime::builder()
            .config(config)
            .peer(PeerId(peer))
            .role(role)
            .bus(self.bus.clone())
            .oracles(oracles)
            .templates(templates())
            .services(services)
            .build()
            .await
            .expect("runtime should build")
    }
}

/// Lets every worker run for a while of simulated time.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}
