//! The hostile agent: lifecycle, authoritative simulation and mirror
//! application.
//!
//! An agent runs the same code on every instance. On the authoritative
//! instance [`Agent::tick`] senses, steps the behavior loop, moves and deals
//! contact damage; everything it decides is emitted as a
//! [`ReplicatedEvent`] that is applied locally through the same path a
//! mirror uses. On a mirror, `tick` only interpolates toward the last
//! replicated transform and plays out knockback.
use glam::Vec2;

use crate::behavior::{
    AgentStateMachine, BehaviorLoop, Countdown, LoopContext, LoopSignal, Transition,
    TransitionCause,
};
use crate::combat::{
    ContactCooldowns, DamageOutcome, Knockback, knockback_direction, resolve_damage,
    scale_for_elite,
};
use crate::config::AgentConfig;
use crate::env::{
    AgentEnv, Collaborators, LayerMask, PathPlanner, Rolls, compute_seed, roll,
};
use crate::error::{ArenaError, ConfigurationError};
use crate::locomotion::Locomotion;
use crate::replication::{
    DamageEvent, DamageRequest, KnockbackEvent, Outbox, ReplicatedEvent, SpawnPayload, Versioned,
};
use crate::sensor::{Acquisition, ChaseVerdict, evaluate_chase, scan_for_target};
use crate::state::{AgentSnapshot, AgentState, EntityId, Health, TickContext};

/// Prefix added to the display name of elite agents.
pub const ELITE_PREFIX: &str = "Elite ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created but not yet initialized.
    Pending,
    Active,
    /// A configuration error disabled simulation for this agent.
    Disabled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Body {
    position: Vec2,
    facing: Vec2,
    velocity: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransformSample {
    pub position: Vec2,
    pub facing: Vec2,
    pub velocity: Vec2,
}

/// Why a damage report was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IntakeRejection {
    UnknownAgent,
    Destroyed,
    Disabled,
    ZeroAmount,
}

/// Result of [`Agent::apply_incoming_damage`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageIntake {
    /// The authority decided the outcome and emitted it.
    Applied(DamageOutcome),
    /// Not authoritative here; the request must go to the authority.
    Forward(DamageRequest),
    Ignored(IntakeRejection),
}

#[derive(Debug)]
pub struct Agent {
    id: EntityId,
    config: AgentConfig,
    spawn: SpawnPayload,
    is_elite: bool,
    scale: f32,
    lifecycle: Lifecycle,
    destroyed: bool,

    body: Body,
    machine: AgentStateMachine,
    locomotion: Locomotion,
    knockback: Knockback,
    contacts: ContactCooldowns,
    scan_timer: Countdown,
    transform_timer: Countdown,

    // ===== replicated fields =====
    health: Versioned<f32>,
    replicated_state: Versioned<(AgentState, Option<EntityId>)>,
    chase_indicator: Versioned<bool>,
    transform: Versioned<TransformSample>,
    knockback_seq: u64,

    seq: u64,
    rng_nonce: u64,
    was_authoritative: bool,
    retargeted: bool,
    outbox: Outbox,
}

impl Agent {
    /// Builds an agent from its spawn payload.
    ///
    /// Used both by the authority when it spawns and by mirrors when the
    /// spawn event arrives; the elite flag is taken from the payload and never
    /// changes afterward.
    pub fn from_spawn(spawn: SpawnPayload, config: AgentConfig) -> Self {
        let scale = if spawn.is_elite {
            config.elite_scale_multiplier
        } else {
            1.0
        };
        let version = spawn.seq;
        let transform = TransformSample {
            position: spawn.position,
            facing: spawn.facing,
            velocity: Vec2::ZERO,
        };

        Self {
            id: spawn.agent,
            is_elite: spawn.is_elite,
            scale,
            lifecycle: Lifecycle::Pending,
            destroyed: false,
            body: Body {
                position: spawn.position,
                facing: spawn.facing,
                velocity: Vec2::ZERO,
            },
            machine: AgentStateMachine::new(),
            locomotion: Locomotion::new(),
            knockback: Knockback::default(),
            contacts: ContactCooldowns::new(),
            scan_timer: Countdown::new(config.detection_check_interval),
            transform_timer: Countdown::new(config.transform_sync_interval),
            health: Versioned::new(config.max_health, version),
            replicated_state: Versioned::new((AgentState::Roaming, None), version),
            chase_indicator: Versioned::new(false, version),
            transform: Versioned::new(transform, version),
            knockback_seq: version,
            seq: version,
            rng_nonce: 0,
            was_authoritative: false,
            retargeted: false,
            outbox: Outbox::default(),
            config,
            spawn,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn template(&self) -> &str {
        &self.spawn.template
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn is_elite(&self) -> bool {
        self.is_elite
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn facing(&self) -> Vec2 {
        self.body.facing
    }

    pub fn health(&self) -> Health {
        Health {
            current: self.health.value(),
            maximum: self.config.max_health,
        }
    }

    /// Replicated behavior state; canonical on the authority.
    pub fn state(&self) -> AgentState {
        self.replicated_state.value().0
    }

    pub fn target(&self) -> Option<EntityId> {
        self.replicated_state.value().1
    }

    pub fn chase_indicator(&self) -> bool {
        self.chase_indicator.value()
    }

    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_active()
    }

    /// Highest sequence number emitted or observed for this agent.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn display_name(&self) -> String {
        self.spawn.shown_name()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        let (state, target) = self.replicated_state.value();
        AgentSnapshot {
            id: self.id,
            display_name: self.display_name(),
            template: self.spawn.template.clone(),
            is_elite: self.is_elite,
            scale: self.scale,
            position: self.body.position,
            facing: self.body.facing,
            velocity: self.body.velocity,
            health: self.health(),
            state,
            target,
            chase_indicator: self.chase_indicator.value(),
            knockback_active: self.knockback.is_active(),
            destroyed: self.destroyed,
            authoritative: self.was_authoritative,
            last_seq: self.seq,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Validates configuration and collaborators.
    ///
    /// On failure the agent is disabled and logged; the error is returned so
    /// the caller can report it, but the rest of the session is unaffected.
    pub fn init(&mut self, env: &AgentEnv<'_>) -> Result<(), ConfigurationError> {
        let result = self
            .config
            .validate()
            .and_then(|()| env.resolve().map(|_| ()).map_err(ConfigurationError::from));

        match &result {
            Ok(()) => {
                self.lifecycle = Lifecycle::Active;
                self.was_authoritative = env.authority().is_authoritative(self.id);
                if self.was_authoritative {
                    self.resume_authority(env);
                }
                tracing::debug!(
                    target: "arena::agent",
                    agent = %self.id,
                    template = %self.spawn.template,
                    elite = self.is_elite,
                    "agent initialized"
                );
            }
            Err(err) => self.disable(err.clone()),
        }
        result
    }

    /// Advances the agent by one simulation step.
    pub fn tick(&mut self, ctx: &TickContext, env: &AgentEnv<'_>) {
        if self.lifecycle != Lifecycle::Active || self.destroyed {
            return;
        }

        let authoritative = env.authority().is_authoritative(self.id);
        if authoritative != self.was_authoritative {
            self.was_authoritative = authoritative;
            if authoritative {
                self.resume_authority(env);
            } else {
                self.relinquish_authority(env);
            }
        }

        if authoritative {
            self.simulate(ctx, env);
        } else {
            self.mirror_tick(ctx.dt);
        }
        self.retargeted = false;
    }

    /// Announces removal and tears the agent down. Authority only.
    pub fn despawn(&mut self, env: &AgentEnv<'_>) {
        let seq = self.next_seq();
        self.publish(
            ReplicatedEvent::Despawned {
                agent: self.id,
                seq,
            },
            env,
        );
        self.teardown(env);
    }

    /// Cancels outstanding work before the agent is dropped.
    pub fn teardown(&mut self, env: &AgentEnv<'_>) {
        self.locomotion.halt(env.planner());
        self.machine.suspend();
        self.knockback.cancel();
        tracing::debug!(target: "arena::agent", agent = %self.id, "agent torn down");
    }

    fn disable(&mut self, err: ConfigurationError) {
        self.lifecycle = Lifecycle::Disabled;
        self.machine.suspend();
        self.locomotion.halt(None);
        tracing::error!(
            target: "arena::agent",
            agent = %self.id,
            code = err.error_code(),
            severity = err.severity().as_str(),
            error = %err,
            "agent simulation disabled"
        );
    }

    // ========================================================================
    // Authority handover
    // ========================================================================

    /// Re-derives state from locally observable data and starts a fresh loop.
    ///
    /// Nothing of the previous authority's loop is inherited: a replicated
    /// chase only resumes if the target still passes the continuation check.
    fn resume_authority(&mut self, env: &AgentEnv<'_>) {
        let collab = match env.resolve() {
            Ok(collab) => collab,
            Err(err) => {
                self.disable(err.into());
                return;
            }
        };

        self.locomotion.halt(Some(collab.planner));
        self.contacts = ContactCooldowns::new();
        self.scan_timer.reset(self.config.detection_check_interval);
        self.transform_timer = Countdown::expired();

        let (state, target) = self.replicated_state.value();
        self.machine.adopt(state, target);

        let transition = match (state, target) {
            (AgentState::Chasing, Some(target)) => match evaluate_chase(
                collab.physics,
                collab.players,
                self.body.position,
                Some(target),
                self.config.detection_radius,
            ) {
                ChaseVerdict::Continue(_) => self
                    .machine
                    .enter_chasing(target, TransitionCause::AuthorityResumed),
                ChaseVerdict::Lost(reason) => {
                    self.machine.enter_roaming(TransitionCause::Lost(reason))
                }
            },
            _ => self.machine.enter_roaming(TransitionCause::AuthorityResumed),
        };

        tracing::debug!(
            target: "arena::agent",
            agent = %self.id,
            state = %self.machine.state(),
            seq = self.seq,
            "authority resumed"
        );

        if let Some(transition) = transition {
            self.on_transition(transition, Some(collab.planner), env);
        }
    }

    fn relinquish_authority(&mut self, env: &AgentEnv<'_>) {
        self.machine.suspend();
        self.locomotion.halt(env.planner());
        tracing::debug!(target: "arena::agent", agent = %self.id, "authority relinquished");
    }

    // ========================================================================
    // Authoritative simulation
    // ========================================================================

    fn simulate(&mut self, ctx: &TickContext, env: &AgentEnv<'_>) {
        let collab = match env.resolve() {
            Ok(collab) => collab,
            Err(err) => {
                self.disable(err.into());
                return;
            }
        };

        self.locomotion
            .poll(collab.planner, self.machine.tokens(), self.id);

        if self.scan_timer.tick(ctx.dt) {
            self.scan_timer.reset(self.config.detection_check_interval);
            self.evaluate(&collab, env);
        }

        if self.step_behavior(ctx.dt, &collab) == LoopSignal::TargetLost {
            self.evaluate(&collab, env);
        }

        self.integrate(ctx.dt);
        self.deal_contact_damage(ctx.now, &collab, env);

        if self.transform_timer.tick(ctx.dt) {
            self.transform_timer.reset(self.config.transform_sync_interval);
            let seq = self.next_seq();
            self.publish(
                ReplicatedEvent::Transform {
                    agent: self.id,
                    seq,
                    position: self.body.position,
                    facing: self.body.facing,
                    velocity: self.body.velocity,
                },
                env,
            );
        }
    }

    /// Sensor evaluation: passive acquisition while roaming, continuation
    /// check while chasing.
    fn evaluate(&mut self, collab: &Collaborators<'_>, env: &AgentEnv<'_>) {
        let position = self.body.position;
        let transition = match self.machine.state() {
            AgentState::Roaming => match scan_for_target(
                collab.physics,
                collab.players,
                position,
                self.body.facing,
                self.config.detection_radius,
                self.config.field_of_view_degrees,
            ) {
                Acquisition::Spotted(player) => self
                    .machine
                    .enter_chasing(player.id, TransitionCause::Spotted),
                Acquisition::OutsideFov(player) => {
                    tracing::trace!(target: "arena::sensor", agent = %self.id, player = %player, "candidate outside field of view");
                    None
                }
                Acquisition::Obstructed(player) => {
                    tracing::trace!(target: "arena::sensor", agent = %self.id, player = %player, "candidate obstructed");
                    None
                }
                Acquisition::None => None,
            },
            AgentState::Chasing => match evaluate_chase(
                collab.physics,
                collab.players,
                position,
                self.machine.target(),
                self.config.detection_radius,
            ) {
                ChaseVerdict::Continue(_) => None,
                ChaseVerdict::Lost(reason) => {
                    self.machine.enter_roaming(TransitionCause::Lost(reason))
                }
            },
        };

        if let Some(transition) = transition {
            self.on_transition(transition, Some(collab.planner), env);
        }
    }

    fn step_behavior(&mut self, dt: f32, collab: &Collaborators<'_>) -> LoopSignal {
        let cx = LoopContext {
            agent: self.id,
            position: self.body.position,
            config: &self.config,
            collaborators: *collab,
            dt,
        };

        let tokens = *self.machine.tokens();
        let Some(active) = self.machine.active_mut() else {
            return LoopSignal::Continue;
        };
        if !tokens.is_current(active.token()) {
            tracing::trace!(target: "arena::behavior", agent = %self.id, "stale loop step skipped");
            return LoopSignal::Continue;
        }

        match active {
            BehaviorLoop::Roam(roam) => {
                let mut rolls =
                    Rolls::new(collab.rng, collab.session_seed, self.id, &mut self.rng_nonce);
                roam.step(&cx, &mut rolls, &mut self.locomotion)
            }
            BehaviorLoop::Chase(chase) => chase.step(&cx, &mut self.locomotion),
        }
    }

    /// Moves the body. Knockback suppresses path following entirely.
    fn integrate(&mut self, dt: f32) {
        if self.knockback.is_active() {
            let velocity = self.knockback.tick(dt);
            self.body.position += velocity * dt;
            self.body.velocity = velocity;
            return;
        }

        let step = self.locomotion.advance(
            self.body.position,
            self.config.move_speed,
            self.config.arrival_tolerance,
            dt,
        );
        self.body.position = step.position;
        self.body.velocity = step.velocity;
        if let Some(direction) = step.velocity.try_normalize() {
            self.body.facing = direction;
        }
    }

    fn deal_contact_damage(&mut self, now: f64, collab: &Collaborators<'_>, env: &AgentEnv<'_>) {
        self.forget_departed_players(collab);

        let reach = self.config.contact_radius * self.scale;
        let mut touching =
            collab
                .physics
                .overlap_circle(self.body.position, reach, LayerMask::PLAYERS);
        touching.sort_unstable();
        touching.dedup();

        for player_id in touching {
            let Some(player) = collab.players.resolve(player_id) else {
                continue;
            };
            if !player.alive
                || !self.contacts.try_trigger(
                    self.id,
                    player.id,
                    now,
                    self.config.contact_damage_cooldown,
                )
            {
                continue;
            }

            let amount = scale_for_elite(
                self.config.contact_damage,
                self.is_elite,
                self.config.elite_damage_multiplier,
            );
            tracing::debug!(
                target: "arena::combat",
                agent = %self.id,
                player = %player.id,
                amount,
                "contact damage"
            );

            let seq = self.next_seq();
            self.publish(
                ReplicatedEvent::Damage(DamageEvent {
                    agent: self.id,
                    seq,
                    target: player.id,
                    attacker: self.id,
                    amount,
                    resulting_health: None,
                    will_destroy: false,
                }),
                env,
            );

            if self.config.knockback_power > 0.0 {
                let seq = self.next_seq();
                self.publish(
                    ReplicatedEvent::Knockback(KnockbackEvent {
                        agent: self.id,
                        seq,
                        target: player.id,
                        attacker: self.id,
                        power: self.config.knockback_power,
                        source: self.body.position,
                    }),
                    env,
                );
            }
        }
    }

    /// Cooldowns for players that left or died are never consulted again.
    fn forget_departed_players(&mut self, collab: &Collaborators<'_>) {
        let departed: Vec<EntityId> = self
            .contacts
            .targets()
            .filter(|&id| collab.players.resolve(id).is_none_or(|player| !player.alive))
            .collect();
        for id in departed {
            self.contacts.forget(id);
        }
    }

    fn on_transition(
        &mut self,
        transition: Transition,
        planner: Option<&dyn PathPlanner>,
        env: &AgentEnv<'_>,
    ) {
        self.locomotion.halt(planner);
        tracing::debug!(
            target: "arena::behavior",
            agent = %self.id,
            from = %transition.from,
            to = %transition.to,
            target_player = ?transition.target,
            cause = %transition.cause,
            "state transition"
        );

        let seq = self.next_seq();
        self.publish(
            ReplicatedEvent::StateChanged {
                agent: self.id,
                seq,
                state: transition.to,
                target: transition.target,
            },
            env,
        );
        let seq = self.next_seq();
        self.publish(
            ReplicatedEvent::ChaseIndicator {
                agent: self.id,
                seq,
                visible: transition.to == AgentState::Chasing,
            },
            env,
        );
    }

    // ========================================================================
    // Damage intake
    // ========================================================================

    /// Entry point for weapon hits.
    ///
    /// Only the authority decides the outcome. The raw amount is scaled by
    /// the elite multiplier once, then emitted and applied through the
    /// replication path. A hit from a live player also pulls the agent into
    /// a chase regardless of facing or line of sight.
    pub fn apply_incoming_damage(
        &mut self,
        amount: f32,
        attacker: EntityId,
        env: &AgentEnv<'_>,
    ) -> DamageIntake {
        if self.destroyed {
            return DamageIntake::Ignored(IntakeRejection::Destroyed);
        }
        if self.lifecycle != Lifecycle::Active {
            return DamageIntake::Ignored(IntakeRejection::Disabled);
        }
        if !env.authority().is_authoritative(self.id) {
            return DamageIntake::Forward(DamageRequest {
                agent: self.id,
                amount,
                attacker,
            });
        }

        let scaled = scale_for_elite(amount, self.is_elite, self.config.elite_damage_multiplier);
        let outcome = resolve_damage(self.health.value(), scaled);
        if outcome.amount <= 0.0 {
            return DamageIntake::Ignored(IntakeRejection::ZeroAmount);
        }

        let attacker_view = env.players().and_then(|players| players.resolve(attacker));

        tracing::debug!(
            target: "arena::combat",
            agent = %self.id,
            attacker = %attacker,
            amount = outcome.amount,
            health = outcome.resulting_health,
            "weapon damage applied"
        );

        let seq = self.next_seq();
        self.publish(
            ReplicatedEvent::Damage(DamageEvent {
                agent: self.id,
                seq,
                target: self.id,
                attacker,
                amount: outcome.amount,
                resulting_health: Some(outcome.resulting_health),
                will_destroy: outcome.will_destroy,
            }),
            env,
        );

        if outcome.will_destroy {
            return DamageIntake::Applied(outcome);
        }

        if self.config.hit_knockback_power > 0.0 {
            let source = attacker_view.map_or(self.body.position, |player| player.position);
            let seq = self.next_seq();
            self.publish(
                ReplicatedEvent::Knockback(KnockbackEvent {
                    agent: self.id,
                    seq,
                    target: self.id,
                    attacker,
                    power: self.config.hit_knockback_power,
                    source,
                }),
                env,
            );
        }

        if let Some(player) = attacker_view.filter(|player| player.alive) {
            self.react_to_hit(player.id, env);
        }

        DamageIntake::Applied(outcome)
    }

    /// Damage-triggered chase. The first retarget between two ticks wins.
    fn react_to_hit(&mut self, attacker: EntityId, env: &AgentEnv<'_>) {
        let cause = match self.machine.state() {
            AgentState::Chasing if self.machine.is_chasing(attacker) => return,
            AgentState::Chasing => TransitionCause::Retarget,
            AgentState::Roaming => TransitionCause::Damaged,
        };
        if self.retargeted {
            tracing::debug!(
                target: "arena::behavior",
                agent = %self.id,
                attacker = %attacker,
                "already retargeted this tick; ignoring"
            );
            return;
        }
        self.retargeted = true;

        if let Some(transition) = self.machine.enter_chasing(attacker, cause) {
            self.on_transition(transition, env.planner(), env);
        }
    }

    // ========================================================================
    // Replication
    // ========================================================================

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Applies an event locally, then queues it for broadcast.
    fn publish(&mut self, event: ReplicatedEvent, env: &AgentEnv<'_>) {
        self.apply_replicated(&event, env);
        self.outbox.push(event);
    }

    /// Queues the spawn announcement. Called once by the spawning authority.
    pub fn announce_spawn(&mut self) {
        self.outbox.push(ReplicatedEvent::Spawned(self.spawn.clone()));
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ReplicatedEvent> + '_ {
        self.outbox.drain()
    }

    /// Applies a replicated event. Returns `true` if any field changed.
    ///
    /// Every field is last-write-wins by sequence number, so duplicates and
    /// reordered deliveries are harmless.
    pub fn apply_replicated(&mut self, event: &ReplicatedEvent, env: &AgentEnv<'_>) -> bool {
        if event.agent() != self.id {
            return false;
        }
        self.seq = self.seq.max(event.seq());

        match event {
            // Identity and the elite flag are fixed at spawn.
            ReplicatedEvent::Spawned(_) => false,
            ReplicatedEvent::Damage(damage) if damage.target == self.id => {
                self.apply_damage(damage)
            }
            ReplicatedEvent::Knockback(knockback) if knockback.target == self.id => {
                self.apply_knockback(knockback, env)
            }
            // Aimed at a player; handled by the player's health component.
            ReplicatedEvent::Damage(_) | ReplicatedEvent::Knockback(_) => false,
            ReplicatedEvent::StateChanged {
                seq, state, target, ..
            } => self.replicated_state.set_if_newer((*state, *target), *seq),
            ReplicatedEvent::ChaseIndicator { seq, visible, .. } => {
                self.chase_indicator.set_if_newer(*visible, *seq)
            }
            ReplicatedEvent::Transform {
                seq,
                position,
                facing,
                velocity,
                ..
            } => self.transform.set_if_newer(
                TransformSample {
                    position: *position,
                    facing: *facing,
                    velocity: *velocity,
                },
                *seq,
            ),
            ReplicatedEvent::Despawned { .. } => {
                let changed = !self.destroyed;
                self.destroyed = true;
                changed
            }
        }
    }

    fn apply_damage(&mut self, damage: &DamageEvent) -> bool {
        let resulting = damage
            .resulting_health
            .unwrap_or_else(|| self.health.value() - damage.amount)
            .max(0.0);
        if !self.health.set_if_newer(resulting, damage.seq) {
            return false;
        }
        if damage.will_destroy || self.health.value() <= 0.0 {
            self.destroyed = true;
        }
        true
    }

    fn apply_knockback(&mut self, knockback: &KnockbackEvent, env: &AgentEnv<'_>) -> bool {
        if knockback.seq <= self.knockback_seq {
            return false;
        }
        self.knockback_seq = knockback.seq;

        // Every instance derives the same fallback from the event itself.
        let nonce = (u64::from(knockback.attacker.0) << 32) ^ knockback.seq;
        let seed = compute_seed(
            env.session_seed(),
            nonce,
            knockback.target.0,
            roll::KNOCKBACK_FALLBACK,
        );
        let push = knockback_direction(
            knockback.source,
            self.body.position,
            env.rng().unit_f32(seed),
        );
        if push.degenerate {
            tracing::warn!(
                target: "arena::combat",
                agent = %self.id,
                attacker = %knockback.attacker,
                "knockback source coincides with target; using fallback direction"
            );
        }

        self.knockback
            .start(push.direction * knockback.power, self.config.knockback_time);
        true
    }

    /// Mirror-side step: play out knockback, otherwise interpolate toward the
    /// last replicated transform.
    fn mirror_tick(&mut self, dt: f32) {
        if self.knockback.is_active() {
            let velocity = self.knockback.tick(dt);
            self.body.position += velocity * dt;
            self.body.velocity = velocity;
            return;
        }

        let sample = self.transform.value();
        let alpha = (self.config.mirror_interpolation_rate * dt).clamp(0.0, 1.0);
        self.body.position = self.body.position.lerp(sample.position, alpha);
        self.body.facing = sample.facing;
        self.body.velocity = sample.velocity;
    }

    /// Events that rebuild this agent's replicated state on a fresh mirror.
    ///
    /// Each event carries the version of the field it restores, so applying
    /// them on an up-to-date mirror changes nothing.
    pub fn resync_events(&self) -> Vec<ReplicatedEvent> {
        let (state, target) = self.replicated_state.value();
        let transform = self.transform.value();
        let health = self.health.value();

        vec![
            ReplicatedEvent::Spawned(self.spawn.clone()),
            ReplicatedEvent::Damage(DamageEvent {
                agent: self.id,
                seq: self.health.version(),
                target: self.id,
                attacker: self.id,
                amount: 0.0,
                resulting_health: Some(health),
                will_destroy: health <= 0.0,
            }),
            ReplicatedEvent::StateChanged {
                agent: self.id,
                seq: self.replicated_state.version(),
                state,
                target,
            },
            ReplicatedEvent::ChaseIndicator {
                agent: self.id,
                seq: self.chase_indicator.version(),
                visible: self.chase_indicator.value(),
            },
            ReplicatedEvent::Transform {
                agent: self.id,
                seq: self.transform.version(),
                position: transform.position,
                facing: transform.facing,
                velocity: transform.velocity,
            },
        ]
    }
}
