use std::fmt;

/// Stable network identity for any entity tracked by the simulation.
///
/// Players and agents share one identity space; the registries decide what
/// kind of entity an id refers to. Identities are never reused within a
/// session, so a lookup that fails means the entity is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved identity used to gate session-level work such as spawning.
    ///
    /// Session-level work has no owning entity, but it still needs exactly one
    /// authoritative writer.
    pub const SESSION: Self = Self(u32::MAX);

    #[inline]
    pub const fn is_session(self) -> bool {
        self.0 == Self::SESSION.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Health meter for an agent.
///
/// Health only ever moves down. A value at or below zero means the owner is
/// destroyed, and the stored value is clamped to zero.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Health {
    pub current: f32,
    pub maximum: f32,
}

impl Health {
    pub fn full(maximum: f32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Fraction of maximum health remaining, in `[0, 1]`.
    pub fn ratio(&self) -> f32 {
        if self.maximum <= 0.0 {
            return 0.0;
        }
        (self.current / self.maximum).clamp(0.0, 1.0)
    }
}

/// Simulation clock advanced once per tick by the owning loop.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SimClock {
    /// Seconds since the simulation started.
    pub now: f64,
    /// Number of ticks executed so far.
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt: f32) {
        self.now += f64::from(dt);
        self.tick += 1;
    }
}

/// Per-tick timing handed to every agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    pub now: f64,
    pub dt: f32,
    pub tick: u64,
}

impl TickContext {
    pub fn new(clock: SimClock, dt: f32) -> Self {
        Self {
            now: clock.now,
            dt,
            tick: clock.tick,
        }
    }
}
