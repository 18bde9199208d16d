//! Actor world - a reference host for the composition engine
//!
//! Owns the per-actor pieces a real host would embed (snapshot, motion
//! layer, state manager) and drives them once per frame. Actors never
//! share cursors or locks, so the per-actor passes are independent and
//! large populations are ticked in parallel.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::actor::snapshot::ActorSnapshot;
use crate::core::config::EngineConfig;
use crate::core::error::{ComposureError, Result};
use crate::core::types::{ActorId, Tick};
use crate::manager::goal::StateOverrides;
use crate::manager::{BlockedAxisReport, StateManager, TransitionStats};
use crate::motion::SimulatedMotion;
use crate::registry::StateRegistry;

struct ActorEntry {
    id: ActorId,
    manager: StateManager,
    snapshot: ActorSnapshot,
    motion: SimulatedMotion,
}

/// The world containing all registered actors
pub struct ActorWorld {
    pub current_tick: Tick,
    config: EngineConfig,
    registry: StateRegistry,
    actors: Vec<ActorEntry>,
    index: AHashMap<ActorId, usize>,
    /// Ticks every simulated motion command takes
    motion_latency: u32,
}

impl ActorWorld {
    pub fn new(registry: StateRegistry, config: EngineConfig) -> Self {
        Self {
            current_tick: 0,
            config,
            registry,
            actors: Vec::new(),
            index: AHashMap::new(),
            motion_latency: 2,
        }
    }

    pub fn with_motion_latency(mut self, ticks: u32) -> Self {
        self.motion_latency = ticks;
        self
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn spawn_actor(&mut self) -> ActorId {
        let id = ActorId::new();
        self.index.insert(id, self.actors.len());
        self.actors.push(ActorEntry {
            id,
            manager: StateManager::new(),
            snapshot: ActorSnapshot::new(),
            motion: SimulatedMotion::new(self.motion_latency),
        });
        id
    }

    /// Remove an actor, cancelling any in-flight transition
    pub fn despawn_actor(&mut self, actor: ActorId) -> Result<()> {
        let idx = self
            .index
            .remove(&actor)
            .ok_or(ComposureError::UnknownActor(actor))?;

        let entry = &mut self.actors[idx];
        entry.manager.clear_goal(&mut entry.motion, actor);

        self.actors.swap_remove(idx);
        if let Some(moved) = self.actors.get(idx) {
            self.index.insert(moved.id, idx);
        }
        Ok(())
    }

    fn entry(&self, actor: ActorId) -> Result<&ActorEntry> {
        self.index
            .get(&actor)
            .map(|&idx| &self.actors[idx])
            .ok_or(ComposureError::UnknownActor(actor))
    }

    fn entry_mut(&mut self, actor: ActorId) -> Result<&mut ActorEntry> {
        let idx = *self
            .index
            .get(&actor)
            .ok_or(ComposureError::UnknownActor(actor))?;
        Ok(&mut self.actors[idx])
    }

    /// Request a named state for an actor
    pub fn request_state(
        &mut self,
        actor: ActorId,
        name: &str,
        overrides: StateOverrides,
    ) -> Result<()> {
        let registry = &self.registry;
        let idx = *self
            .index
            .get(&actor)
            .ok_or(ComposureError::UnknownActor(actor))?;
        let entry = &mut self.actors[idx];
        entry
            .manager
            .request_state(registry, name, overrides, &mut entry.motion, actor)
    }

    pub fn is_converged(&self, actor: ActorId) -> Result<bool> {
        let entry = self.entry(actor)?;
        Ok(entry.manager.is_converged(&entry.snapshot, &self.config))
    }

    /// The converged state's name; None while transitioning
    pub fn current_state_name(&self, actor: ActorId) -> Result<Option<String>> {
        let entry = self.entry(actor)?;
        Ok(entry
            .manager
            .current_state_name(&entry.snapshot, &self.config)
            .map(String::from))
    }

    pub fn snapshot(&self, actor: ActorId) -> Result<&ActorSnapshot> {
        Ok(&self.entry(actor)?.snapshot)
    }

    pub fn stats(&self, actor: ActorId) -> Result<TransitionStats> {
        Ok(self.entry(actor)?.manager.stats())
    }

    /// Axes blocked past the warning threshold for one actor
    pub fn stalled_axes(&self, actor: ActorId) -> Result<Vec<BlockedAxisReport>> {
        let entry = self.entry(actor)?;
        Ok(entry.manager.stalled_axes(self.current_tick, &self.config))
    }

    /// Advance the whole world by one frame
    pub fn tick(&mut self) {
        self.current_tick += 1;
        let now = self.current_tick;
        let config = &self.config;

        let step = |entry: &mut ActorEntry| {
            entry.motion.advance(&mut entry.snapshot);
            entry
                .manager
                .tick(entry.id, &entry.snapshot, &mut entry.motion, now, config);
        };

        if self.actors.len() >= self.config.parallel_threshold {
            self.actors.par_iter_mut().for_each(step);
        } else {
            self.actors.iter_mut().for_each(step);
        }
    }

    /// Tick until the actor converges, up to `max_ticks`
    ///
    /// Returns the ticks it took, or None if the actor was still
    /// transitioning at the cutoff.
    pub fn run_until_converged(&mut self, actor: ActorId, max_ticks: u32) -> Result<Option<u32>> {
        for i in 0..max_ticks {
            if self.is_converged(actor)? {
                return Ok(Some(i));
            }
            self.tick();
        }
        Ok(None)
    }
}
