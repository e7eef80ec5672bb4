//! The simulation loop owned by the core.
//!
//! [`Simulation`] keeps the agent registry keyed by stable identity and
//! drives `init`/`tick`/`teardown` on every agent. The same instance runs on
//! the coordinator and on every mirror; the authority gate decides which
//! half of the agent code runs. Events produced by a tick are returned to
//! the caller for broadcast and have already been applied locally.
use std::collections::{BTreeMap, HashMap};

use glam::Vec2;

use crate::agent::{Agent, DamageIntake, IntakeRejection};
use crate::config::AgentConfig;
use crate::env::AgentEnv;
use crate::error::{ArenaError, ConfigurationError, ErrorSeverity};
use crate::replication::{ReplicatedEvent, SpawnPayload};
use crate::spawner::{SpawnOrder, Spawner, SpawnerConfig};
use crate::state::{AgentSnapshot, EntityId, SimClock, TickContext};

/// Agents are numbered from here; lower identities belong to players.
pub const FIRST_AGENT_ID: u32 = 1_000;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SpawnError {
    #[error("only the session authority may spawn agents")]
    NotAuthoritative,

    #[error(transparent)]
    Config(#[from] ConfigurationError),
}

impl ArenaError for SpawnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotAuthoritative => ErrorSeverity::Validation,
            Self::Config(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAuthoritative => "SPAWN_NOT_AUTHORITATIVE",
            Self::Config(err) => err.error_code(),
        }
    }
}

/// What happened to a received event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReplicationOutcome {
    /// At least one replicated field changed.
    Applied,
    /// Duplicate or superseded; nothing changed.
    Stale,
    /// A mirror was created from a spawn event.
    Created,
    /// The agent was removed.
    Removed,
    /// The event is aimed at a player; the player collaborator applies it.
    External,
    /// No agent with this identity is known here.
    UnknownAgent,
    /// The agent was despawned earlier; late events are dropped.
    Ignored,
}

/// Everything one call to [`Simulation::tick`] produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Events to broadcast, in emission order.
    pub events: Vec<ReplicatedEvent>,
    pub spawned: Vec<EntityId>,
    /// Agents removed this tick because their health ran out, as they were
    /// just before removal.
    pub destroyed: Vec<AgentSnapshot>,
}

/// Simulated seconds a despawned identity is remembered.
///
/// Within this window late events for the identity are dropped and resync
/// answers repeat its removal; afterwards it is forgotten.
pub const TOMBSTONE_RETENTION_SECS: f64 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tombstone {
    /// Sequence of the `Despawned` event.
    seq: u64,
    recorded_at: f64,
}

pub struct Simulation {
    agents: BTreeMap<EntityId, Agent>,
    templates: HashMap<String, AgentConfig>,
    spawner: Option<Spawner>,
    clock: SimClock,
    next_agent_id: u32,
    /// Recently despawned identities.
    tombstones: BTreeMap<EntityId, Tombstone>,
    /// Events emitted outside an agent's own outbox lifetime.
    pending: Vec<ReplicatedEvent>,
    last_epoch: Option<u64>,
}

impl Simulation {
    pub fn new(templates: impl IntoIterator<Item = (String, AgentConfig)>) -> Self {
        Self {
            agents: BTreeMap::new(),
            templates: templates.into_iter().collect(),
            spawner: None,
            clock: SimClock::default(),
            next_agent_id: FIRST_AGENT_ID,
            tombstones: BTreeMap::new(),
            pending: Vec::new(),
            last_epoch: None,
        }
    }

    pub fn with_spawner(mut self, config: SpawnerConfig) -> Self {
        self.spawner = Some(Spawner::new(config));
        self
    }

    pub fn clock(&self) -> SimClock {
        self.clock
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents that are neither destroyed nor disabled.
    pub fn alive(&self) -> usize {
        self.agents
            .values()
            .filter(|agent| !agent.is_destroyed())
            .count()
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.values().map(Agent::snapshot).collect()
    }

    pub fn has_template(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    // ========================================================================
    // Spawning
    // ========================================================================

    /// Spawns an agent from a template and announces it.
    ///
    /// An agent whose initialization fails is still registered, disabled,
    /// so that every instance agrees on the identity; the error is logged by
    /// the agent.
    pub fn spawn(
        &mut self,
        template: &str,
        position: Vec2,
        facing: Vec2,
        is_elite: bool,
        env: &AgentEnv<'_>,
    ) -> Result<EntityId, SpawnError> {
        if !env.authority().is_authoritative(EntityId::SESSION) {
            return Err(SpawnError::NotAuthoritative);
        }
        let config = self
            .templates
            .get(template)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownTemplate(template.to_string()))?;

        let id = EntityId(self.next_agent_id);
        self.next_agent_id += 1;

        let payload = SpawnPayload {
            agent: id,
            seq: 1,
            template: template.to_string(),
            display_name: config.display_name.clone(),
            position,
            facing: facing.try_normalize().unwrap_or(Vec2::X),
            is_elite,
        };

        let mut agent = Agent::from_spawn(payload, config);
        // Failure is logged by the agent and leaves it disabled.
        let _ = agent.init(env);
        agent.announce_spawn();

        tracing::info!(
            target: "arena::simulation",
            agent = %id,
            template,
            elite = is_elite,
            name = %agent.display_name(),
            "agent spawned"
        );
        self.agents.insert(id, agent);
        Ok(id)
    }

    fn spawn_order(&mut self, order: SpawnOrder, env: &AgentEnv<'_>) -> Option<EntityId> {
        match self.spawn(
            &order.template,
            order.position,
            order.facing,
            order.is_elite,
            env,
        ) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(
                    target: "arena::simulation",
                    code = err.error_code(),
                    error = %err,
                    "spawn order rejected"
                );
                None
            }
        }
    }

    /// Removes an agent and announces it. Authority only.
    ///
    /// Returns `false` if the agent is unknown or this instance is not its
    /// authority.
    pub fn despawn(&mut self, id: EntityId, env: &AgentEnv<'_>) -> bool {
        if !env.authority().is_authoritative(id) {
            return false;
        }
        let Some(mut agent) = self.agents.remove(&id) else {
            return false;
        };

        agent.despawn(env);
        self.pending.extend(agent.drain_events());
        self.bury(id, agent.seq());
        tracing::info!(target: "arena::simulation", agent = %id, "agent despawned");
        true
    }

    fn bury(&mut self, id: EntityId, seq: u64) {
        self.tombstones.insert(
            id,
            Tombstone {
                seq,
                recorded_at: self.clock.now,
            },
        );
    }

    fn prune_tombstones(&mut self) {
        let now = self.clock.now;
        let before = self.tombstones.len();
        self.tombstones
            .retain(|_, tombstone| now - tombstone.recorded_at < TOMBSTONE_RETENTION_SECS);
        let pruned = before - self.tombstones.len();
        if pruned > 0 {
            tracing::trace!(target: "arena::simulation", pruned, "tombstones expired");
        }
    }

    /// Despawned identities still remembered.
    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    /// Keeps identity allocation ahead of every id seen on the wire, so a
    /// mirror that becomes authority never reuses one.
    fn observe(&mut self, id: EntityId) {
        if id.0 >= self.next_agent_id && !id.is_session() {
            self.next_agent_id = id.0 + 1;
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub fn tick(&mut self, dt: f32, env: &AgentEnv<'_>) -> TickReport {
        self.clock.advance(dt);
        let ctx = TickContext::new(self.clock, dt);

        let epoch = env.authority().epoch();
        if let Some(previous) = self.last_epoch
            && previous != epoch
        {
            tracing::info!(
                target: "arena::simulation",
                from = previous,
                to = epoch,
                authoritative = env.authority().is_authoritative(EntityId::SESSION),
                "authority epoch changed"
            );
        }
        self.last_epoch = Some(epoch);
        self.prune_tombstones();

        let mut report = TickReport::default();

        let alive = self.alive();
        let order = self.spawner.as_mut().and_then(|spawner| {
            spawner.tick(dt, alive, env.authority(), env.rng(), env.session_seed())
        });
        if let Some(order) = order
            && let Some(id) = self.spawn_order(order, env)
        {
            report.spawned.push(id);
        }

        for agent in self.agents.values_mut() {
            agent.tick(&ctx, env);
        }

        let destroyed: Vec<AgentSnapshot> = self
            .agents
            .values()
            .filter(|agent| agent.is_destroyed())
            .map(Agent::snapshot)
            .collect();
        for snapshot in destroyed {
            if self.despawn(snapshot.id, env) {
                report.destroyed.push(snapshot);
            }
        }

        report.events = self.drain_events();
        report
    }

    /// Collects every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<ReplicatedEvent> {
        let mut events = std::mem::take(&mut self.pending);
        for agent in self.agents.values_mut() {
            events.extend(agent.drain_events());
        }
        events
    }

    // ========================================================================
    // Damage intake
    // ========================================================================

    /// Routes a weapon hit to its agent. See [`Agent::apply_incoming_damage`].
    pub fn apply_incoming_damage(
        &mut self,
        agent: EntityId,
        amount: f32,
        attacker: EntityId,
        env: &AgentEnv<'_>,
    ) -> DamageIntake {
        match self.agents.get_mut(&agent) {
            Some(target) => target.apply_incoming_damage(amount, attacker, env),
            None => {
                tracing::debug!(
                    target: "arena::combat",
                    agent = %agent,
                    attacker = %attacker,
                    "damage for unknown agent dropped"
                );
                DamageIntake::Ignored(IntakeRejection::UnknownAgent)
            }
        }
    }

    // ========================================================================
    // Replication
    // ========================================================================

    /// Applies an event received from the bus.
    pub fn apply_replicated(
        &mut self,
        event: &ReplicatedEvent,
        env: &AgentEnv<'_>,
    ) -> ReplicationOutcome {
        let id = event.agent();
        if self.tombstones.contains_key(&id) {
            return ReplicationOutcome::Ignored;
        }

        let Some(agent) = self.agents.get_mut(&id) else {
            return self.apply_to_unknown(event, env);
        };

        if let ReplicatedEvent::Despawned { .. } = event {
            agent.apply_replicated(event, env);
            agent.teardown(env);
            self.agents.remove(&id);
            self.bury(id, event.seq());
            tracing::info!(target: "arena::simulation", agent = %id, "mirror removed");
            return ReplicationOutcome::Removed;
        }

        let changed = agent.apply_replicated(event, env);
        if event.targets_other_entity() {
            ReplicationOutcome::External
        } else if changed {
            ReplicationOutcome::Applied
        } else {
            ReplicationOutcome::Stale
        }
    }

    fn apply_to_unknown(
        &mut self,
        event: &ReplicatedEvent,
        env: &AgentEnv<'_>,
    ) -> ReplicationOutcome {
        match event {
            ReplicatedEvent::Spawned(payload) => {
                let Some(config) = self.templates.get(&payload.template).cloned() else {
                    tracing::warn!(
                        target: "arena::replication",
                        agent = %payload.agent,
                        template = %payload.template,
                        "spawn for unknown template dropped"
                    );
                    return ReplicationOutcome::UnknownAgent;
                };

                let mut agent = Agent::from_spawn(payload.clone(), config);
                let _ = agent.init(env);
                self.observe(payload.agent);
                tracing::info!(
                    target: "arena::replication",
                    agent = %payload.agent,
                    name = %agent.display_name(),
                    "mirror created"
                );
                self.agents.insert(payload.agent, agent);
                ReplicationOutcome::Created
            }
            ReplicatedEvent::Despawned { agent, seq } => {
                self.bury(*agent, *seq);
                ReplicationOutcome::Ignored
            }
            other => {
                tracing::warn!(
                    target: "arena::replication",
                    agent = %other.agent(),
                    kind = %other.kind(),
                    seq = other.seq(),
                    "event for unknown agent dropped"
                );
                ReplicationOutcome::UnknownAgent
            }
        }
    }

    /// Events that rebuild this instance's view on a fresh or lagging mirror.
    pub fn snapshot_events(&self) -> Vec<ReplicatedEvent> {
        let despawned = self
            .tombstones
            .iter()
            .map(|(&agent, tombstone)| ReplicatedEvent::Despawned {
                agent,
                seq: tombstone.seq,
            });
        self.agents
            .values()
            .flat_map(Agent::resync_events)
            .chain(despawned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::SessionRole;
    use crate::replication::EventKind;
    use crate::state::AgentState;
    use crate::testing::Harness;

    const DT: f32 = 0.05;

    fn templates() -> Vec<(String, AgentConfig)> {
        vec![(
            "grunt".to_string(),
            AgentConfig {
                display_name: "Grunt".into(),
                ..AgentConfig::default()
            },
        )]
    }

    fn spawner() -> SpawnerConfig {
        SpawnerConfig {
            max_alive: 2,
            respawn_interval: 0.5,
            elite_chance: 0.0,
            spawn_points: vec![Vec2::new(10.0, 10.0)],
            templates: vec!["grunt".into()],
        }
    }

    #[test]
    fn spawner_fills_up_to_max_alive() {
        let harness = Harness::coordinator();
        let mut sim = Simulation::new(templates()).with_spawner(spawner());

        let mut spawned = Vec::new();
        for _ in 0..100 {
            spawned.extend(sim.tick(DT, &harness.env()).spawned);
        }

        assert_eq!(spawned, vec![EntityId(FIRST_AGENT_ID), EntityId(FIRST_AGENT_ID + 1)]);
        assert_eq!(sim.alive(), 2);
    }

    #[test]
    fn peers_do_not_spawn_or_emit() {
        let harness = Harness::peer();
        let mut sim = Simulation::new(templates()).with_spawner(spawner());

        for _ in 0..40 {
            let report = sim.tick(DT, &harness.env());
            assert!(report.events.is_empty());
        }
        assert!(sim.is_empty());
        assert_eq!(
            sim.spawn("grunt", Vec2::ZERO, Vec2::X, false, &harness.env()),
            Err(SpawnError::NotAuthoritative)
        );
    }

    #[test]
    fn unknown_template_is_rejected() {
        let harness = Harness::coordinator();
        let mut sim = Simulation::new(templates());

        let err = sim
            .spawn("dragon", Vec2::ZERO, Vec2::X, false, &harness.env())
            .unwrap_err();

        assert_eq!(err.error_code(), "CONFIG_UNKNOWN_TEMPLATE");
    }

    #[test]
    fn lethal_damage_despawns_on_next_tick() {
        let harness = Harness::coordinator();
        let mut sim = Simulation::new(templates());
        let id = sim
            .spawn("grunt", Vec2::ZERO, Vec2::X, false, &harness.env())
            .unwrap();

        sim.apply_incoming_damage(id, 500.0, EntityId(1), &harness.env());
        let report = sim.tick(DT, &harness.env());

        assert_eq!(
            report.destroyed.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![id]
        );
        assert!(sim.agent(id).is_none());
        let kinds: Vec<_> = report.events.iter().map(ReplicatedEvent::kind).collect();
        assert_eq!(kinds.first(), Some(&EventKind::Spawned));
        assert_eq!(kinds.last(), Some(&EventKind::Despawned));
    }

    #[test]
    fn mirror_tracks_the_coordinator_through_the_wire_vocabulary() {
        let coordinator = Harness::coordinator();
        let peer = Harness::peer();
        let attacker = coordinator.world.put_player(1, Vec2::new(3.0, 0.0));
        peer.world.put_player(1, Vec2::new(3.0, 0.0));

        let mut authority = Simulation::new(templates());
        let mut mirror = Simulation::new(templates());
        let id = authority
            .spawn("grunt", Vec2::ZERO, Vec2::X, true, &coordinator.env())
            .unwrap();

        let mut events = authority.drain_events();
        authority.apply_incoming_damage(id, 10.0, attacker, &coordinator.env());
        for _ in 0..10 {
            events.extend(authority.tick(DT, &coordinator.env()).events);
        }
        for event in &events {
            mirror.apply_replicated(event, &peer.env());
        }

        let canonical = authority.agent(id).unwrap().snapshot();
        let view = mirror.agent(id).unwrap().snapshot();
        assert_eq!(view.display_name, "Elite Grunt");
        assert!(view.is_elite);
        assert_eq!(view.health, canonical.health);
        assert_eq!(view.health.current, 80.0);
        assert_eq!(view.state, AgentState::Chasing);
        assert_eq!(view.target, Some(attacker));
        assert_eq!(view.last_seq, canonical.last_seq);
    }

    #[test]
    fn duplicate_spawn_never_toggles_elite() {
        let peer = Harness::peer();
        let mut mirror = Simulation::new(templates());
        let payload = SpawnPayload {
            agent: EntityId(1_500),
            seq: 1,
            template: "grunt".into(),
            display_name: "Grunt".into(),
            position: Vec2::ZERO,
            facing: Vec2::X,
            is_elite: false,
        };

        assert_eq!(
            mirror.apply_replicated(&ReplicatedEvent::Spawned(payload.clone()), &peer.env()),
            ReplicationOutcome::Created
        );
        let elite = SpawnPayload {
            is_elite: true,
            seq: 7,
            ..payload
        };
        assert_eq!(
            mirror.apply_replicated(&ReplicatedEvent::Spawned(elite), &peer.env()),
            ReplicationOutcome::Stale
        );
        assert!(!mirror.agent(EntityId(1_500)).unwrap().is_elite());
    }

    #[test]
    fn tombstones_expire_after_the_retention_window() {
        let harness = Harness::coordinator();
        let mut sim = Simulation::new(templates());
        let id = sim
            .spawn("grunt", Vec2::ZERO, Vec2::X, false, &harness.env())
            .unwrap();
        assert!(sim.despawn(id, &harness.env()));

        sim.tick(1.0, &harness.env());
        assert_eq!(sim.tombstone_count(), 1);
        assert!(sim
            .snapshot_events()
            .iter()
            .any(|event| matches!(event, ReplicatedEvent::Despawned { agent, .. } if *agent == id)));

        for _ in 0..TOMBSTONE_RETENTION_SECS as usize {
            sim.tick(1.0, &harness.env());
        }
        assert_eq!(sim.tombstone_count(), 0);
        assert!(sim.snapshot_events().is_empty());
    }

    #[test]
    fn events_after_despawn_are_ignored() {
        let peer = Harness::peer();
        let mut mirror = Simulation::new(templates());
        let id = EntityId(1_200);

        assert_eq!(
            mirror.apply_replicated(&ReplicatedEvent::Despawned { agent: id, seq: 9 }, &peer.env()),
            ReplicationOutcome::Ignored
        );
        assert_eq!(
            mirror.apply_replicated(
                &ReplicatedEvent::ChaseIndicator {
                    agent: id,
                    seq: 10,
                    visible: true
                },
                &peer.env()
            ),
            ReplicationOutcome::Ignored
        );
        assert_eq!(
            mirror.apply_replicated(
                &ReplicatedEvent::ChaseIndicator {
                    agent: EntityId(1_201),
                    seq: 1,
                    visible: true
                },
                &peer.env()
            ),
            ReplicationOutcome::UnknownAgent
        );
    }

    #[test]
    fn snapshot_rebuilds_a_fresh_mirror() {
        let coordinator = Harness::coordinator();
        let peer = Harness::peer();
        let mut authority = Simulation::new(templates());
        let id = authority
            .spawn("grunt", Vec2::new(2.0, 2.0), Vec2::X, false, &coordinator.env())
            .unwrap();
        authority.apply_incoming_damage(id, 25.0, EntityId(1), &coordinator.env());
        for _ in 0..5 {
            authority.tick(DT, &coordinator.env());
        }

        let mut mirror = Simulation::new(templates());
        for event in authority.snapshot_events() {
            mirror.apply_replicated(&event, &peer.env());
        }
        // Applying the same snapshot twice changes nothing.
        for event in authority.snapshot_events() {
            let outcome = mirror.apply_replicated(&event, &peer.env());
            assert_eq!(outcome, ReplicationOutcome::Stale);
        }

        let view = mirror.agent(id).unwrap();
        assert_eq!(view.health().current, 75.0);
        assert_eq!(view.state(), authority.agent(id).unwrap().state());
    }

    #[test]
    fn promoted_peer_continues_identity_allocation() {
        let peer = Harness::peer();
        let mut sim = Simulation::new(templates());
        let payload = SpawnPayload {
            agent: EntityId(1_004),
            seq: 1,
            template: "grunt".into(),
            display_name: "Grunt".into(),
            position: Vec2::ZERO,
            facing: Vec2::X,
            is_elite: false,
        };
        sim.apply_replicated(&ReplicatedEvent::Spawned(payload), &peer.env());

        peer.authority.set_role(SessionRole::Coordinator);
        sim.tick(DT, &peer.env());
        let id = sim
            .spawn("grunt", Vec2::ZERO, Vec2::X, false, &peer.env())
            .unwrap();

        assert_eq!(id, EntityId(1_005));
        assert!(sim.agent(EntityId(1_004)).unwrap().snapshot().authoritative);
    }
}
