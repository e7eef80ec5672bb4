//! In-memory collaborators for unit tests.
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec2;

use crate::authority::SessionAuthority;
use crate::env::{
    AgentEnv, LayerMask, NavigationOracle, PathFailure, PathHandle, PathPlanner, PathPoll,
    PcgRng, PhysicsOracle, PlayerRegistry, PlayerView, RayHit,
};
use crate::state::EntityId;

/// Every point is walkable.
pub struct OpenField;

impl NavigationOracle for OpenField {
    fn nearest_walkable_node(&self, point: Vec2) -> Option<Vec2> {
        Some(point)
    }
}

/// No point is walkable.
pub struct Unwalkable;

impl NavigationOracle for Unwalkable {
    fn nearest_walkable_node(&self, _point: Vec2) -> Option<Vec2> {
        None
    }
}

#[derive(Clone, Copy, Debug)]
enum PlannerMode {
    Immediate,
    Pending,
    /// Ready once a handle has been polled this many times.
    Delayed(u32),
    Failing(PathFailure),
}

/// Planner that answers according to a fixed mode and records every call.
pub struct FakePlanner {
    mode: PlannerMode,
    next: AtomicU64,
    requests: Mutex<BTreeMap<PathHandle, (EntityId, Vec2, Vec2)>>,
    polls: Mutex<BTreeMap<PathHandle, u32>>,
    cancelled: Mutex<Vec<PathHandle>>,
}

impl FakePlanner {
    fn with_mode(mode: PlannerMode) -> Self {
        Self {
            mode,
            next: AtomicU64::new(1),
            requests: Mutex::new(BTreeMap::new()),
            polls: Mutex::new(BTreeMap::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }

    /// Straight line to the destination, ready on the first poll.
    pub fn immediate() -> Self {
        Self::with_mode(PlannerMode::Immediate)
    }

    pub fn pending() -> Self {
        Self::with_mode(PlannerMode::Pending)
    }

    /// Answers each request only after `polls` polls, like a planner that
    /// needs several ticks.
    pub fn delayed(polls: u32) -> Self {
        Self::with_mode(PlannerMode::Delayed(polls))
    }

    pub fn failing(reason: PathFailure) -> Self {
        Self::with_mode(PlannerMode::Failing(reason))
    }

    pub fn requests(&self) -> Vec<(EntityId, Vec2, Vec2)> {
        self.requests.lock().unwrap().values().copied().collect()
    }

    pub fn last_destination(&self) -> Option<Vec2> {
        self.requests
            .lock()
            .unwrap()
            .values()
            .next_back()
            .map(|(_, _, to)| *to)
    }

    pub fn cancelled(&self) -> Vec<PathHandle> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl PathPlanner for FakePlanner {
    fn request_path(&self, agent: EntityId, from: Vec2, to: Vec2) -> PathHandle {
        let handle = PathHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.requests
            .lock()
            .unwrap()
            .insert(handle, (agent, from, to));
        handle
    }

    fn poll_path(&self, handle: PathHandle) -> PathPoll {
        let Some((_, _, to)) = self.requests.lock().unwrap().get(&handle).copied() else {
            return PathPoll::Failed(PathFailure::UnknownHandle);
        };
        match self.mode {
            PlannerMode::Immediate => PathPoll::Ready(vec![to]),
            PlannerMode::Pending => PathPoll::Pending,
            PlannerMode::Delayed(needed) => {
                let mut polls = self.polls.lock().unwrap();
                let seen = polls.entry(handle).or_default();
                *seen += 1;
                if *seen >= needed {
                    PathPoll::Ready(vec![to])
                } else {
                    PathPoll::Pending
                }
            }
            PlannerMode::Failing(reason) => PathPoll::Failed(reason),
        }
    }

    fn cancel_path(&self, handle: PathHandle) {
        self.cancelled.lock().unwrap().push(handle);
    }
}

/// Players plus circular sight blockers.
#[derive(Default)]
pub struct FakeWorld {
    players: Mutex<BTreeMap<EntityId, PlayerView>>,
    blockers: Mutex<Vec<(Vec2, f32)>>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_player(&self, id: u32, position: Vec2) -> EntityId {
        let id = EntityId(id);
        self.players.lock().unwrap().insert(
            id,
            PlayerView {
                id,
                position,
                alive: true,
            },
        );
        id
    }

    pub fn move_player(&self, id: EntityId, position: Vec2) {
        if let Some(player) = self.players.lock().unwrap().get_mut(&id) {
            player.position = position;
        }
    }

    pub fn kill_player(&self, id: EntityId) {
        if let Some(player) = self.players.lock().unwrap().get_mut(&id) {
            player.alive = false;
        }
    }

    pub fn remove_player(&self, id: EntityId) {
        self.players.lock().unwrap().remove(&id);
    }

    pub fn add_blocker(&self, center: Vec2, radius: f32) {
        self.blockers.lock().unwrap().push((center, radius));
    }

    pub fn clear_blockers(&self) {
        self.blockers.lock().unwrap().clear();
    }
}

impl PhysicsOracle for FakeWorld {
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        if !mask.contains(LayerMask::PLAYERS) {
            return Vec::new();
        }
        self.players
            .lock()
            .unwrap()
            .values()
            .filter(|player| player.position.distance(center) <= radius)
            .map(|player| player.id)
            .collect()
    }

    fn raycast(&self, from: Vec2, to: Vec2, mask: LayerMask) -> Option<RayHit> {
        if !mask.contains(LayerMask::OBSTACLES) {
            return None;
        }
        let segment = to - from;
        let length_squared = segment.length_squared();
        self.blockers
            .lock()
            .unwrap()
            .iter()
            .find_map(|&(center, radius)| {
                let t = if length_squared > 0.0 {
                    ((center - from).dot(segment) / length_squared).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let closest = from + segment * t;
                (closest.distance(center) <= radius).then(|| RayHit {
                    entity: None,
                    point: closest,
                    distance: closest.distance(from),
                })
            })
    }
}

impl PlayerRegistry for FakeWorld {
    fn resolve(&self, id: EntityId) -> Option<PlayerView> {
        self.players.lock().unwrap().get(&id).copied()
    }
}

/// Owns one of every collaborator and lends them out as an [`AgentEnv`].
pub struct Harness {
    pub authority: SessionAuthority,
    pub rng: PcgRng,
    pub navigation: OpenField,
    pub planner: FakePlanner,
    pub world: FakeWorld,
    pub session_seed: u64,
}

impl Harness {
    pub fn coordinator() -> Self {
        Self::with_authority(SessionAuthority::coordinator())
    }

    pub fn peer() -> Self {
        Self::with_authority(SessionAuthority::peer())
    }

    pub fn with_authority(authority: SessionAuthority) -> Self {
        Self {
            authority,
            rng: PcgRng,
            navigation: OpenField,
            planner: FakePlanner::immediate(),
            world: FakeWorld::new(),
            session_seed: 0x5eed,
        }
    }

    pub fn env(&self) -> AgentEnv<'_> {
        AgentEnv::with_all(
            &self.authority,
            &self.rng,
            self.session_seed,
            &self.navigation,
            &self.planner,
            &self.world,
            &self.world,
        )
    }
}
