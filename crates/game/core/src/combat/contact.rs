use std::collections::HashMap;

use crate::state::EntityId;

/// Contact damage cooldowns keyed by `(attacker, target)`.
///
/// Stores the time of the last hit that went through for each pair. A pair
/// that has never hit is always ready.
#[derive(Clone, Debug, Default)]
pub struct ContactCooldowns {
    last_hit: HashMap<(EntityId, EntityId), f64>,
}

impl ContactCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a hit at `now` if the pair is off cooldown.
    ///
    /// Returns `true` when the hit goes through.
    pub fn try_trigger(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        now: f64,
        cooldown: f32,
    ) -> bool {
        let key = (attacker, target);
        if let Some(&last) = self.last_hit.get(&key)
            && now - last < f64::from(cooldown)
        {
            return false;
        }
        self.last_hit.insert(key, now);
        true
    }

    pub fn last_hit(&self, attacker: EntityId, target: EntityId) -> Option<f64> {
        self.last_hit.get(&(attacker, target)).copied()
    }

    /// Targets with a recorded hit.
    pub fn targets(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.last_hit.keys().map(|&(_, target)| target)
    }

    pub fn len(&self) -> usize {
        self.last_hit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_hit.is_empty()
    }

    /// Drops entries that involve `entity`.
    pub fn forget(&mut self, entity: EntityId) {
        self.last_hit
            .retain(|(attacker, target), _| *attacker != entity && *target != entity);
    }
}
