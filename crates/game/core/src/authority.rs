//! Single-writer authority.
//!
//! Exactly one instance in a session decides state transitions and applies
//! damage for a given entity. Every other instance only applies replicated
//! events. The gate is queried on every tick so that a role change takes
//! effect on the next simulation step.
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use crate::state::EntityId;

/// Decides whether the local instance may simulate and mutate an entity.
pub trait AuthorityGate: Send + Sync {
    fn is_authoritative(&self, entity: EntityId) -> bool;

    /// Counter bumped whenever the answer of [`Self::is_authoritative`] may
    /// have changed. Callers compare epochs to detect a handover.
    fn epoch(&self) -> u64;
}

/// Role of this process within the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SessionRole {
    /// The privileged process that simulates every agent.
    Coordinator,
    Peer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    Online,
    /// No session at all: the local process owns everything.
    Offline,
}

/// Authority derived from session role and connectivity.
///
/// One gate covers every entity of the session; there is no per-entity
/// ownership. Updates are atomic so the gate can be shared between the
/// simulation and the code that reacts to session events.
#[derive(Debug)]
pub struct SessionAuthority {
    role: AtomicU8,
    connectivity: AtomicU8,
    epoch: AtomicU64,
}

impl SessionAuthority {
    pub fn new(role: SessionRole, connectivity: Connectivity) -> Self {
        Self {
            role: AtomicU8::new(encode_role(role)),
            connectivity: AtomicU8::new(encode_connectivity(connectivity)),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn coordinator() -> Self {
        Self::new(SessionRole::Coordinator, Connectivity::Online)
    }

    pub fn peer() -> Self {
        Self::new(SessionRole::Peer, Connectivity::Online)
    }

    pub fn offline() -> Self {
        Self::new(SessionRole::Peer, Connectivity::Offline)
    }

    pub fn role(&self) -> SessionRole {
        decode_role(self.role.load(Ordering::Acquire))
    }

    pub fn connectivity(&self) -> Connectivity {
        decode_connectivity(self.connectivity.load(Ordering::Acquire))
    }

    /// Changes the role and bumps the epoch. Returns the previous role.
    pub fn set_role(&self, role: SessionRole) -> SessionRole {
        let previous = decode_role(self.role.swap(encode_role(role), Ordering::AcqRel));
        if previous != role {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            tracing::info!(
                target: "arena::authority",
                from = %previous,
                to = %role,
                "session role changed"
            );
        }
        previous
    }

    pub fn set_connectivity(&self, connectivity: Connectivity) -> Connectivity {
        let previous = decode_connectivity(
            self.connectivity
                .swap(encode_connectivity(connectivity), Ordering::AcqRel),
        );
        if previous != connectivity {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            tracing::info!(
                target: "arena::authority",
                from = %previous,
                to = %connectivity,
                "connectivity changed"
            );
        }
        previous
    }

    /// Whether this process simulates the session at all.
    pub fn is_simulating(&self) -> bool {
        self.connectivity() == Connectivity::Offline || self.role() == SessionRole::Coordinator
    }
}

impl Default for SessionAuthority {
    fn default() -> Self {
        Self::offline()
    }
}

impl AuthorityGate for SessionAuthority {
    fn is_authoritative(&self, _entity: EntityId) -> bool {
        self.is_simulating()
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

const fn encode_role(role: SessionRole) -> u8 {
    match role {
        SessionRole::Coordinator => 0,
        SessionRole::Peer => 1,
    }
}

const fn decode_role(raw: u8) -> SessionRole {
    match raw {
        0 => SessionRole::Coordinator,
        _ => SessionRole::Peer,
    }
}

const fn encode_connectivity(connectivity: Connectivity) -> u8 {
    match connectivity {
        Connectivity::Online => 0,
        Connectivity::Offline => 1,
    }
}

const fn decode_connectivity(raw: u8) -> Connectivity {
    match raw {
        0 => Connectivity::Online,
        _ => Connectivity::Offline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_coordinator_or_offline_is_authoritative() {
        let agent = EntityId(4);

        assert!(SessionAuthority::coordinator().is_authoritative(agent));
        assert!(SessionAuthority::offline().is_authoritative(agent));
        assert!(!SessionAuthority::peer().is_authoritative(agent));

        let offline_coordinator = SessionAuthority::new(SessionRole::Coordinator, Connectivity::Offline);
        assert!(offline_coordinator.is_authoritative(agent));
    }

    #[test]
    fn role_change_bumps_epoch_once() {
        let gate = SessionAuthority::peer();
        assert_eq!(gate.epoch(), 0);

        assert_eq!(gate.set_role(SessionRole::Coordinator), SessionRole::Peer);
        assert_eq!(gate.epoch(), 1);
        assert!(gate.is_authoritative(EntityId::SESSION));

        // Setting the same role again is not a handover.
        gate.set_role(SessionRole::Coordinator);
        assert_eq!(gate.epoch(), 1);
    }

    #[test]
    fn losing_connectivity_makes_a_peer_authoritative() {
        let gate = SessionAuthority::peer();
        gate.set_connectivity(Connectivity::Offline);

        assert!(gate.is_authoritative(EntityId(1)));
        assert_eq!(gate.epoch(), 1);
    }
}
