//! High-level runtime orchestrator.
//!
//! The runtime owns one simulation worker, wires up its command channel and
//! bus subscriptions, and exposes a builder-based API. Several runtimes built
//! on the same [`ReplicationBus`] form one session: one coordinator and any
//! number of mirrors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use arena_content::SessionConfig;
use arena_core::{AgentConfig, Connectivity, SessionAuthority, SessionRole, Simulation, SpawnerConfig};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::events::{PeerId, ReplicationBus};
use crate::oracle::OracleManager;
use crate::pathing::RetryPolicy;
use crate::services::Services;
use crate::workers::{Command, SimulationWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub tick_hz: u32,
    pub session_seed: u64,
    pub bus_capacity: usize,
    pub command_buffer_size: usize,
    pub pathing: RetryPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_hz: 20,
            session_seed: 0,
            bus_capacity: 1024,
            command_buffer_size: 64,
            pathing: RetryPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_session(config: &SessionConfig) -> Self {
        Self {
            tick_hz: config.session.tick_hz,
            session_seed: config.session.seed,
            bus_capacity: config.bus.capacity,
            command_buffer_size: config.bus.command_buffer,
            pathing: RetryPolicy {
                timeout: Duration::from_millis(config.pathing.timeout_ms),
                retries: config.pathing.retries,
                backoff: Duration::from_millis(config.pathing.backoff_ms),
            },
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

/// One instance of the session.
///
/// Design: Runtime owns the worker and coordinates its lifetime.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    authority: Arc<SessionAuthority>,
    shutdown_tx: oneshot::Sender<()>,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn peer(&self) -> PeerId {
        self.handle.peer()
    }

    /// The authority gate this instance's agents consult.
    pub fn authority(&self) -> &Arc<SessionAuthority> {
        &self.authority
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        let _ = self.shutdown_tx.send(());

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    peer: PeerId,
    role: SessionRole,
    connectivity: Connectivity,
    bus: Option<ReplicationBus>,
    oracles: Option<OracleManager>,
    templates: Vec<(String, AgentConfig)>,
    spawner: Option<SpawnerConfig>,
    services: Services,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            peer: PeerId::default(),
            role: SessionRole::Coordinator,
            connectivity: Connectivity::Online,
            bus: None,
            oracles: None,
            templates: Vec::new(),
            spawner: None,
            services: Services::default(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn peer(mut self, peer: PeerId) -> Self {
        self.peer = peer;
        self
    }

    pub fn role(mut self, role: SessionRole) -> Self {
        self.role = role;
        self
    }

    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Join an existing session bus. Without one the runtime gets a private
    /// bus sized from the config.
    pub fn bus(mut self, bus: ReplicationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Set required oracle manager
    pub fn oracles(mut self, oracles: OracleManager) -> Self {
        self.oracles = Some(oracles);
        self
    }

    /// Agent templates, keyed by the name spawn payloads refer to.
    pub fn templates(mut self, templates: impl IntoIterator<Item = (String, AgentConfig)>) -> Self {
        self.templates = templates.into_iter().collect();
        self
    }

    /// Enable periodic spawning while this instance holds session authority.
    pub fn spawner(mut self, spawner: SpawnerConfig) -> Self {
        self.spawner = Some(spawner);
        self
    }

    pub fn services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Build the runtime and start its worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let oracles = self.oracles.ok_or(RuntimeError::MissingOracles)?;
        let bus = self
            .bus
            .unwrap_or_else(|| ReplicationBus::with_capacity(self.config.bus_capacity));
        let authority = Arc::new(SessionAuthority::new(self.role, self.connectivity));

        let mut simulation = Simulation::new(self.templates);
        if let Some(spawner) = self.spawner {
            simulation = simulation.with_spawner(spawner);
        }

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = RuntimeHandle::new(self.peer, command_tx, bus.clone());

        let worker = SimulationWorker::new(
            self.peer,
            simulation,
            authority.clone(),
            oracles,
            self.services,
            bus,
            self.config.tick_period(),
            command_rx,
            shutdown_rx,
        );

        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        Ok(Runtime {
            handle,
            authority,
            shutdown_tx,
            worker_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_content::ConfigLoader;

    #[test]
    fn config_follows_the_session_file() {
        let session = ConfigLoader::parse(
            r#"
            [session]
            tick_hz = 30
            seed = 99

            [bus]
            capacity = 16
            command_buffer = 4

            [pathing]
            timeout_ms = 100
            retries = 1
            backoff_ms = 20
            "#,
        )
        .unwrap();

        let config = RuntimeConfig::from_session(&session);
        assert_eq!(config.tick_hz, 30);
        assert_eq!(config.session_seed, 99);
        assert_eq!(config.bus_capacity, 16);
        assert_eq!(config.command_buffer_size, 4);
        assert_eq!(config.pathing.timeout, Duration::from_millis(100));
        assert_eq!(config.pathing.retries, 1);
        assert_eq!(config.pathing.backoff, Duration::from_millis(20));
    }

    #[test]
    fn tick_period_never_divides_by_zero() {
        let config = RuntimeConfig {
            tick_hz: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert_eq!(
            RuntimeConfig::default().tick_period(),
            Duration::from_millis(50)
        );
    }
}
