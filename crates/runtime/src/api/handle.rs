//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! reporting hits, spawning agents, switching authority, and watching the
//! replication bus.
use glam::Vec2;
use tokio::sync::{broadcast, mpsc, oneshot};

use arena_core::{AgentSnapshot, Connectivity, DamageIntake, EntityId, SessionRole};

use super::errors::{Result, RuntimeError};
use crate::events::{Envelope, PeerId, ReplicationBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    peer: PeerId,
    command_tx: mpsc::Sender<Command>,
    bus: ReplicationBus,
}

impl RuntimeHandle {
    pub(crate) fn new(peer: PeerId, command_tx: mpsc::Sender<Command>, bus: ReplicationBus) -> Self {
        Self {
            peer,
            command_tx,
            bus,
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    async fn request<T>(&self, command: Command, reply_rx: oneshot::Receiver<T>) -> Result<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Report a weapon hit on an agent.
    ///
    /// On an instance that is not the agent's authority the hit is forwarded
    /// over the bus and [`DamageIntake::Forward`] is returned.
    pub async fn apply_damage(
        &self,
        agent: EntityId,
        amount: f32,
        attacker: EntityId,
    ) -> Result<DamageIntake> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(
            Command::ApplyDamage {
                agent,
                amount,
                attacker,
                reply,
            },
            reply_rx,
        )
        .await
    }

    /// Spawn an agent from a template. Session authority only.
    pub async fn spawn(
        &self,
        template: impl Into<String>,
        position: Vec2,
        facing: Vec2,
        is_elite: bool,
    ) -> Result<EntityId> {
        let (reply, reply_rx) = oneshot::channel();
        let id = self
            .request(
                Command::Spawn {
                    template: template.into(),
                    position,
                    facing,
                    is_elite,
                    reply,
                },
                reply_rx,
            )
            .await??;
        Ok(id)
    }

    /// Remove an agent. Returns `false` if this instance is not its
    /// authority or does not know it.
    pub async fn despawn(&self, agent: EntityId) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::Despawn { agent, reply }, reply_rx).await
    }

    /// Query every agent known to this instance (read-only snapshot)
    pub async fn agents(&self) -> Result<Vec<AgentSnapshot>> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::QueryAgents { reply }, reply_rx).await
    }

    /// Query one agent.
    pub async fn agent(&self, id: EntityId) -> Result<AgentSnapshot> {
        self.agents()
            .await?
            .into_iter()
            .find(|snapshot| snapshot.id == id)
            .ok_or(RuntimeError::UnknownAgent(id))
    }

    /// Change this instance's session role. Returns the previous role.
    pub async fn set_role(&self, role: SessionRole) -> Result<SessionRole> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::SetRole { role, reply }, reply_rx).await
    }

    pub async fn set_connectivity(&self, connectivity: Connectivity) -> Result<Connectivity> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(
            Command::SetConnectivity {
                connectivity,
                reply,
            },
            reply_rx,
        )
        .await
    }

    /// Ask the session authority to rebroadcast its full view.
    pub async fn request_resync(&self) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(Command::RequestResync { reply }, reply_rx).await
    }

    /// Subscribe to frames on a specific topic
    ///
    /// Frames published by every instance are delivered, including this
    /// one's; compare [`Envelope::origin`] with [`Self::peer`] to filter.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe(topic)
    }

    pub fn bus(&self) -> &ReplicationBus {
        &self.bus
    }
}
