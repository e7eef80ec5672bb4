//! Boots one coordinator and its mirrors on a shared bus and runs them.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::Vec2;
use serde::Serialize;
use tokio::time::Instant;

use arena_content::ContentBundle;
use arena_core::{AgentSnapshot, EntityId, Health, SessionRole};
use arena_runtime::{
    NavGrid, OracleManager, PeerId, PlayerDirectory, ReplicationBus, Runtime, RuntimeConfig,
    RuntimeHandle,
};

use crate::config::ServerConfig;
use crate::players::ScriptedPlayers;

#[derive(Debug, Serialize)]
pub struct PeerSummary {
    pub peer: u32,
    pub role: SessionRole,
    pub agents: Vec<AgentSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct PlayerSummary {
    pub id: EntityId,
    pub position: Vec2,
    pub health: Health,
}

/// Final state of every instance, printed when the session ends.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub elapsed_secs: f64,
    pub peers: Vec<PeerSummary>,
    pub players: Vec<PlayerSummary>,
}

pub struct ArenaSession {
    runtimes: Vec<Runtime>,
    players: ScriptedPlayers,
    directory: Arc<PlayerDirectory>,
    tick: Duration,
    duration: Option<Duration>,
    handover_after: Option<Duration>,
}

impl ArenaSession {
    pub async fn boot(bundle: ContentBundle, server: &ServerConfig) -> Result<Self> {
        let ContentBundle {
            session,
            templates,
            arena,
        } = bundle;
        let config = RuntimeConfig::from_session(&session);
        let bus = ReplicationBus::with_capacity(config.bus_capacity);
        let directory = Arc::new(PlayerDirectory::new());
        let spawner = session.spawner_config(&arena, templates.iter().map(|(key, _)| key.as_str()));

        let mut runtimes = Vec::with_capacity(session.session.mirrors + 1);
        for index in 0..=session.session.mirrors {
            let role = if index == 0 {
                SessionRole::Coordinator
            } else {
                SessionRole::Peer
            };
            let oracles = OracleManager::for_arena(
                arena.clone(),
                directory.clone(),
                config.session_seed,
                config.pathing,
            );

            let mut builder = Runtime::builder()
                .config(config.clone())
                .peer(PeerId(index as u32))
                .role(role)
                .bus(bus.clone())
                .oracles(oracles)
                .templates(templates.clone());
            if let Some(spawner) = &spawner {
                builder = builder.spawner(spawner.clone());
            }
            let runtime = builder
                .build()
                .await
                .with_context(|| format!("starting peer {index}"))?;
            runtimes.push(runtime);
        }

        let starts = arena.player_starts();
        let count = if server.players > 0 {
            server.players
        } else {
            starts.len().max(1)
        };
        let players = ScriptedPlayers::new(
            directory.clone(),
            Arc::new(NavGrid::new(arena.clone())),
            &starts,
            count,
            runtimes.len(),
            config.session_seed,
        );

        tracing::info!(
            arena = %arena.name,
            peers = runtimes.len(),
            players = players.len(),
            templates = templates.len(),
            tick_hz = config.tick_hz,
            seed = config.session_seed,
            "session started"
        );

        Ok(Self {
            runtimes,
            players,
            directory,
            tick: config.tick_period(),
            duration: (session.session.duration_secs > 0)
                .then(|| Duration::from_secs(session.session.duration_secs)),
            handover_after: server.handover_after_secs.map(Duration::from_secs),
        })
    }

    fn handles(&self) -> Vec<RuntimeHandle> {
        self.runtimes.iter().map(Runtime::handle).collect()
    }

    /// Runs until the configured duration elapses or Ctrl-C.
    pub async fn run(mut self) -> Result<SessionSummary> {
        let handles = self.handles();
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.tick);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut handed_over = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut ctrl_c => {
                    tracing::info!("interrupted");
                    break;
                }
            }

            let elapsed = started.elapsed();
            if self.duration.is_some_and(|limit| elapsed >= limit) {
                break;
            }
            if !handed_over
                && handles.len() > 1
                && self.handover_after.is_some_and(|after| elapsed >= after)
            {
                handed_over = true;
                tracing::info!(from = %handles[0].peer(), to = %handles[1].peer(), "handing over authority");
                handles[0].set_role(SessionRole::Peer).await?;
                handles[1].set_role(SessionRole::Coordinator).await?;
            }

            self.players.step(self.tick, &handles).await?;
        }

        let summary = self.summarize(started.elapsed()).await?;
        for runtime in self.runtimes {
            runtime.shutdown().await?;
        }
        Ok(summary)
    }

    async fn summarize(&self, elapsed: Duration) -> Result<SessionSummary> {
        let mut peers = Vec::with_capacity(self.runtimes.len());
        for runtime in &self.runtimes {
            peers.push(PeerSummary {
                peer: runtime.peer().0,
                role: runtime.authority().role(),
                agents: runtime.handle().agents().await?,
            });
        }
        let players = self
            .directory
            .players()
            .into_iter()
            .map(|record| PlayerSummary {
                id: record.id,
                position: record.position,
                health: record.health,
            })
            .collect();

        Ok(SessionSummary {
            elapsed_secs: elapsed.as_secs_f64(),
            peers,
            players,
        })
    }
}
