//! Simulation worker.
//!
//! Owns one instance's [`Simulation`] and drives it from three sources: a
//! fixed-rate tick, commands from [`crate::RuntimeHandle`], and frames from
//! the replication bus. Everything the simulation emits is applied locally
//! first and then published, so receivers skip frames carrying their own
//! origin. Forwarded damage arrives through a lossless inbox instead of
//! the intake broadcast, since a lost hit cannot be recovered by a resync.
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use arena_core::{
    AgentSnapshot, AuthorityGate, Connectivity, DamageIntake, DamageRequest, EntityId,
    ReplicatedEvent, ReplicationOutcome, SessionAuthority, SessionRole, Simulation,
    SpawnError,
};

use crate::events::{Envelope, Frame, PeerId, ReplicationBus, Topic};
use crate::oracle::{OracleManager, PlayerEffect};
use crate::services::Services;

/// Commands that can be sent to the simulation worker.
pub(crate) enum Command {
    /// Report a weapon hit on an agent.
    ApplyDamage {
        agent: EntityId,
        amount: f32,
        attacker: EntityId,
        reply: oneshot::Sender<DamageIntake>,
    },
    Spawn {
        template: String,
        position: Vec2,
        facing: Vec2,
        is_elite: bool,
        reply: oneshot::Sender<Result<EntityId, SpawnError>>,
    },
    Despawn {
        agent: EntityId,
        reply: oneshot::Sender<bool>,
    },
    /// Query every agent known to this instance.
    QueryAgents {
        reply: oneshot::Sender<Vec<AgentSnapshot>>,
    },
    SetRole {
        role: SessionRole,
        reply: oneshot::Sender<SessionRole>,
    },
    SetConnectivity {
        connectivity: Connectivity,
        reply: oneshot::Sender<Connectivity>,
    },
    /// Ask the session authority to rebroadcast its view.
    RequestResync { reply: oneshot::Sender<()> },
}

/// Background worker that owns one instance of the simulation.
pub(crate) struct SimulationWorker {
    peer: PeerId,
    simulation: Simulation,
    authority: Arc<SessionAuthority>,
    oracles: OracleManager,
    services: Services,
    bus: ReplicationBus,
    tick_period: Duration,
    command_rx: mpsc::Receiver<Command>,
    shutdown_rx: oneshot::Receiver<()>,
    replication_rx: broadcast::Receiver<Envelope>,
    /// Forwarded damage; lossless, unlike the broadcast topics.
    intake_rx: mpsc::UnboundedReceiver<Envelope>,
    control_rx: broadcast::Receiver<Envelope>,
    warned_missing_presentation: bool,
    /// Frames were lost; a resync goes out with the next tick.
    resync_owed: bool,
}

impl SimulationWorker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        peer: PeerId,
        simulation: Simulation,
        authority: Arc<SessionAuthority>,
        oracles: OracleManager,
        services: Services,
        bus: ReplicationBus,
        tick_period: Duration,
        command_rx: mpsc::Receiver<Command>,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        // Subscribe before anything is published so no frame is missed.
        let replication_rx = bus.subscribe(Topic::Replication);
        let intake_rx = bus.open_inbox(peer);
        let control_rx = bus.subscribe(Topic::Control);

        Self {
            peer,
            simulation,
            authority,
            oracles,
            services,
            bus,
            tick_period,
            command_rx,
            shutdown_rx,
            replication_rx,
            intake_rx,
            control_rx,
            warned_missing_presentation: false,
            resync_owed: false,
        }
    }

    /// Main worker loop
    pub(crate) async fn run(mut self) {
        tracing::info!(
            target: "arena::worker",
            peer = %self.peer,
            role = %self.authority.role(),
            connectivity = %self.authority.connectivity(),
            "simulation worker started"
        );

        // A fresh mirror has nothing yet; ask for the authority's view.
        if !self.authority.is_simulating() {
            self.request_resync();
        }

        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut self.shutdown_rx => break,
                _ = ticker.tick() => self.step(),
                Some(command) = self.command_rx.recv() => self.handle_command(command),
                received = self.replication_rx.recv() => self.on_received(Topic::Replication, received),
                Some(envelope) = self.intake_rx.recv() => self.on_received(Topic::Intake, Ok(envelope)),
                received = self.control_rx.recv() => self.on_received(Topic::Control, received),
                else => break,
            }
        }

        tracing::info!(
            target: "arena::worker",
            peer = %self.peer,
            agents = self.simulation.len(),
            "simulation worker stopped"
        );
    }

    // ========================================================================
    // Tick
    // ========================================================================

    fn step(&mut self) {
        // At most one request per tick, so a snapshot larger than the bus
        // cannot keep a mirror asking forever.
        if std::mem::take(&mut self.resync_owed) && !self.authority.is_simulating() {
            self.request_resync();
        }

        let dt = self.tick_period.as_secs_f32();
        let env = self.oracles.as_agent_env(self.authority.as_ref());
        let report = self.simulation.tick(dt, &env);

        // Snapshot names already carry the elite prefix.
        for snapshot in &report.destroyed {
            self.services
                .chat
                .announce(&format!("{} was destroyed", snapshot.display_name));
            self.services
                .cleanup
                .schedule(snapshot.id, self.services.cleanup_delay);
        }

        self.broadcast(report.events);
    }

    /// Drains events emitted outside a tick and broadcasts them.
    fn flush(&mut self) {
        let events = self.simulation.drain_events();
        self.broadcast(events);
    }

    /// Events were already applied to the local simulation.
    fn broadcast(&mut self, events: Vec<ReplicatedEvent>) {
        for event in events {
            if event.targets_other_entity() {
                self.apply_to_player(&event);
            }
            self.present(&event);
            self.publish(&Frame::Event(event));
        }
    }

    fn publish(&self, frame: &Frame) {
        if let Err(err) = self.bus.publish(self.peer, frame) {
            tracing::warn!(
                target: "arena::replication",
                peer = %self.peer,
                topic = ?frame.topic(),
                error = %err,
                "failed to publish frame"
            );
        }
    }

    fn request_resync(&self) {
        tracing::debug!(target: "arena::replication", peer = %self.peer, "requesting resync");
        self.publish(&Frame::ResyncRequest);
    }

    // ========================================================================
    // Commands
    // ========================================================================

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ApplyDamage {
                agent,
                amount,
                attacker,
                reply,
            } => {
                let env = self.oracles.as_agent_env(self.authority.as_ref());
                let intake = self
                    .simulation
                    .apply_incoming_damage(agent, amount, attacker, &env);
                if let DamageIntake::Forward(request) = intake {
                    self.publish(&Frame::Intake(request));
                }
                self.flush();
                let _ = reply.send(intake);
            }
            Command::Spawn {
                template,
                position,
                facing,
                is_elite,
                reply,
            } => {
                let env = self.oracles.as_agent_env(self.authority.as_ref());
                let result = self
                    .simulation
                    .spawn(&template, position, facing, is_elite, &env);
                self.flush();
                let _ = reply.send(result);
            }
            Command::Despawn { agent, reply } => {
                let env = self.oracles.as_agent_env(self.authority.as_ref());
                let removed = self.simulation.despawn(agent, &env);
                self.flush();
                let _ = reply.send(removed);
            }
            Command::QueryAgents { reply } => {
                let _ = reply.send(self.simulation.snapshots());
            }
            Command::SetRole { role, reply } => {
                let _ = reply.send(self.authority.set_role(role));
            }
            Command::SetConnectivity {
                connectivity,
                reply,
            } => {
                let _ = reply.send(self.authority.set_connectivity(connectivity));
            }
            Command::RequestResync { reply } => {
                self.request_resync();
                let _ = reply.send(());
            }
        }
    }

    // ========================================================================
    // Bus
    // ========================================================================

    fn on_received(
        &mut self,
        topic: Topic,
        received: Result<Envelope, broadcast::error::RecvError>,
    ) {
        match received {
            Ok(envelope) => {
                if envelope.origin == self.peer {
                    return;
                }
                match envelope.decode() {
                    Ok(frame) => self.on_frame(envelope.origin, frame),
                    Err(err) => tracing::warn!(
                        target: "arena::replication",
                        peer = %self.peer,
                        origin = %envelope.origin,
                        error = %err,
                        "dropping undecodable frame"
                    ),
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    target: "arena::replication",
                    peer = %self.peer,
                    topic = ?topic,
                    skipped,
                    "fell behind the bus"
                );
                match topic {
                    Topic::Replication => self.resync_owed = true,
                    // Lost resync requests are covered by answering once now.
                    Topic::Control => self.on_resync_request(self.peer),
                    _ => {}
                }
            }
            // The worker holds a sender itself, so the bus outlives it.
            Err(broadcast::error::RecvError::Closed) => {}
        }
    }

    fn on_frame(&mut self, origin: PeerId, frame: Frame) {
        match frame {
            Frame::Event(event) => self.on_replicated(origin, event),
            Frame::Intake(request) => self.on_intake(origin, request),
            Frame::ResyncRequest => self.on_resync_request(origin),
        }
    }

    fn on_replicated(&mut self, origin: PeerId, event: ReplicatedEvent) {
        let env = self.oracles.as_agent_env(self.authority.as_ref());
        let outcome = self.simulation.apply_replicated(&event, &env);
        tracing::trace!(
            target: "arena::replication",
            peer = %self.peer,
            origin = %origin,
            agent = %event.agent(),
            kind = %event.kind(),
            seq = event.seq(),
            outcome = %outcome,
            "event received"
        );

        match outcome {
            ReplicationOutcome::External => self.apply_to_player(&event),
            ReplicationOutcome::Applied
            | ReplicationOutcome::Created
            | ReplicationOutcome::Removed => self.present(&event),
            ReplicationOutcome::Stale
            | ReplicationOutcome::UnknownAgent
            | ReplicationOutcome::Ignored => {}
        }
    }

    fn on_intake(&mut self, origin: PeerId, request: DamageRequest) {
        if !self.authority.is_authoritative(request.agent) {
            return;
        }
        let env = self.oracles.as_agent_env(self.authority.as_ref());
        let intake =
            self.simulation
                .apply_incoming_damage(request.agent, request.amount, request.attacker, &env);
        tracing::debug!(
            target: "arena::combat",
            peer = %self.peer,
            origin = %origin,
            agent = %request.agent,
            amount = request.amount,
            intake = ?intake,
            "forwarded damage applied"
        );
        self.flush();
    }

    fn on_resync_request(&mut self, origin: PeerId) {
        if !self.authority.is_authoritative(EntityId::SESSION) {
            return;
        }
        let events = self.simulation.snapshot_events();
        tracing::info!(
            target: "arena::replication",
            peer = %self.peer,
            requester = %origin,
            events = events.len(),
            "answering resync request"
        );
        for event in events {
            self.publish(&Frame::Event(event));
        }
    }

    // ========================================================================
    // Outward effects
    // ========================================================================

    fn apply_to_player(&self, event: &ReplicatedEvent) {
        let effect = self.oracles.players().apply_effect(event);
        if let PlayerEffect::Damaged { player, health } = effect
            && health <= 0.0
        {
            self.services
                .chat
                .announce(&format!("player {player} was downed by {}", event.agent()));
        }
    }

    fn present(&mut self, event: &ReplicatedEvent) {
        let Some(presentation) = &self.services.presentation else {
            if !self.warned_missing_presentation
                && matches!(
                    event,
                    ReplicatedEvent::Spawned(_) | ReplicatedEvent::ChaseIndicator { .. }
                )
            {
                self.warned_missing_presentation = true;
                tracing::warn!(
                    target: "arena::presentation",
                    peer = %self.peer,
                    "no presentation sink configured; name tags and chase indicators are not shown"
                );
            }
            return;
        };

        match event {
            ReplicatedEvent::Spawned(payload) => {
                presentation.show_name(payload.agent, &payload.shown_name());
            }
            ReplicatedEvent::ChaseIndicator { agent, visible, .. } => {
                presentation.set_chase_indicator(*agent, *visible);
            }
            ReplicatedEvent::Despawned { agent, .. } => presentation.remove(*agent),
            _ => {}
        }
    }
}
