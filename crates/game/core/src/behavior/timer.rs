//! Explicit timers and cancellation tokens for behavior loops.

/// Countdown measured in simulation seconds.
///
/// A countdown created with [`Countdown::expired`] fires on the first tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    pub fn expired() -> Self {
        Self { remaining: 0.0 }
    }

    /// Advances by `dt`. Returns `true` once the countdown has run out.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        self.is_expired()
    }

    pub fn reset(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Generation marker held by one behavior loop.
///
/// Any wait that completes with a token that is no longer current is a stale
/// wakeup and must not act.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BehaviorToken(u64);

impl BehaviorToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Issues tokens; invalidating bumps the generation so that every token
/// issued earlier becomes stale.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenSource {
    generation: u64,
}

impl TokenSource {
    /// Invalidates all outstanding tokens and returns a fresh one.
    pub fn issue(&mut self) -> BehaviorToken {
        self.invalidate();
        BehaviorToken(self.generation)
    }

    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_current(&self, token: BehaviorToken) -> bool {
        token.0 == self.generation
    }
}
