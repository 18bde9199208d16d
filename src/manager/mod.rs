//! Per-actor orchestration
//!
//! The state manager owns the requested goal and one cursor per axis,
//! and drives every axis toward its goal value one edge at a time. It
//! is driven once per tick by the host scheduler; nothing here blocks
//! or suspends.
//!
//! Axes advance independently but coordinate through the shared lock
//! set, and the manager enforces the one rule the actions themselves
//! cannot: every start is matched by exactly one finish, on every path,
//! including goal replacement mid-action.

pub mod goal;

use serde::{Deserialize, Serialize};

use crate::action::{self, ActiveAction, MotionCommand};
use crate::actor::snapshot::ActorSnapshot;
use crate::axis::locks::LockSet;
use crate::axis::{AttributeAxis, AXIS_COUNT, AXIS_ORDER};
use crate::core::config::EngineConfig;
use crate::core::error::{ComposureError, Result};
use crate::core::types::{ActorId, Tick};
use crate::eval::{self, EvalCtx};
use crate::manager::goal::{Goal, StateOverrides};
use crate::motion::MotionInterface;
use crate::registry::StateRegistry;

/// Where one axis stands relative to its goal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AxisPhase {
    /// No active action: at goal, or waiting for something to do
    #[default]
    Idle,
    /// An action is in flight
    Advancing,
    /// Goal not reached but no legal action available; retried every
    /// tick
    Blocked,
}

/// Per-axis bookkeeping for one actor
#[derive(Debug, Clone, Default)]
pub struct AxisCursor {
    pub phase: AxisPhase,
    pub active: Option<ActiveAction>,
    pub last_advance_tick: Tick,
    blocked_since: Option<Tick>,
    warned: bool,
}

impl AxisCursor {
    fn clear_blocked(&mut self) {
        self.blocked_since = None;
        self.warned = false;
    }

    fn reset(&mut self) {
        debug_assert!(self.active.is_none(), "reset with an unfinished action");
        self.phase = AxisPhase::Idle;
        self.clear_blocked();
    }
}

/// An axis that has sat Blocked past the warning threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockedAxisReport {
    pub axis: AttributeAxis,
    pub since: Tick,
    pub blocked_ticks: u64,
}

/// Lifecycle counters, mostly for diagnostics and tests
///
/// Whenever every axis is idle, `starts == finishes` holds; a drift
/// between the two is a lost finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    pub starts: u64,
    pub finishes: u64,
    pub cancellations: u64,
}

/// Orchestrator for one actor
#[derive(Debug, Default)]
pub struct StateManager {
    goal: Option<Goal>,
    cursors: [AxisCursor; AXIS_COUNT],
    locks: LockSet,
    stats: TransitionStats,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the requested goal, converged or not
    pub fn goal_name(&self) -> Option<&str> {
        self.goal.as_ref().map(Goal::name)
    }

    pub fn phase(&self, axis: AttributeAxis) -> AxisPhase {
        self.cursors[axis.index()].phase
    }

    pub fn advancing_axes(&self) -> Vec<AttributeAxis> {
        AXIS_ORDER
            .iter()
            .copied()
            .filter(|axis| self.phase(*axis) == AxisPhase::Advancing)
            .collect()
    }

    pub fn locks(&self) -> &LockSet {
        &self.locks
    }

    pub fn stats(&self) -> TransitionStats {
        self.stats
    }

    /// Replace the goal with the named state
    ///
    /// Unknown names are rejected and the previous goal stays active.
    /// Requesting the already-active goal is a no-op. Otherwise every
    /// in-flight action is finished (cancelled) before the new goal is
    /// installed, so no action started for the old goal ever overlaps
    /// one started for the new.
    pub fn request_state(
        &mut self,
        registry: &StateRegistry,
        name: &str,
        overrides: StateOverrides,
        motion: &mut dyn MotionInterface,
        actor: ActorId,
    ) -> Result<()> {
        let descriptor = registry.resolve(name)?.clone();

        if let Some(weapon) = overrides.weapon {
            if weapon.is_transit() {
                return Err(ComposureError::InvalidDescriptor {
                    name: name.to_string(),
                    problems: vec!["weapon override must be a stable value".to_string()],
                });
            }
        }

        if self
            .goal
            .as_ref()
            .map_or(false, |g| g.matches(name, &overrides))
        {
            return Ok(());
        }

        self.cancel_in_flight(motion, actor);
        tracing::debug!(state = name, "goal installed");
        self.goal = Some(Goal::new(descriptor, overrides));
        Ok(())
    }

    /// Drop the goal entirely, cancelling in-flight work
    ///
    /// Used when the actor leaves the system; with no goal installed
    /// every axis counts as reached.
    pub fn clear_goal(&mut self, motion: &mut dyn MotionInterface, actor: ActorId) {
        self.cancel_in_flight(motion, actor);
        self.goal = None;
    }

    fn cancel_in_flight(&mut self, motion: &mut dyn MotionInterface, actor: ActorId) {
        let Self {
            cursors,
            locks,
            stats,
            ..
        } = self;
        for axis in AXIS_ORDER {
            let cursor = &mut cursors[axis.index()];
            if cursor.phase == AxisPhase::Advancing {
                finish_action(cursor, locks, stats, motion, actor, true);
                stats.cancellations += 1;
            }
            cursor.reset();
        }
    }

    /// One scheduler pass: every axis, in the fixed order
    ///
    /// A lock released by an earlier axis is visible to a later axis
    /// within the same pass, and a completed edge chains straight into
    /// the next one in the same pass.
    pub fn tick(
        &mut self,
        actor: ActorId,
        snapshot: &ActorSnapshot,
        motion: &mut dyn MotionInterface,
        now: Tick,
        config: &EngineConfig,
    ) {
        for axis in AXIS_ORDER {
            self.tick_axis(axis, actor, snapshot, motion, now, config);
        }
    }

    /// Advance a single axis (the per-axis drive entry for hosts that
    /// schedule axes individually through the handle namespace)
    pub fn tick_axis(
        &mut self,
        axis: AttributeAxis,
        actor: ActorId,
        snapshot: &ActorSnapshot,
        motion: &mut dyn MotionInterface,
        now: Tick,
        config: &EngineConfig,
    ) {
        let Self {
            goal,
            cursors,
            locks,
            stats,
        } = self;
        let Some(goal) = goal.as_ref() else { return };

        let cursor = &mut cursors[axis.index()];
        // Completion chains: finish one edge and start the next within
        // the same pass. Two iterations cover that; the third catches
        // a same-tick reissue after a failed effect.
        for _ in 0..3 {
            match step_axis(
                goal, cursor, locks, stats, axis, actor, snapshot, motion, now, config,
            ) {
                StepOutcome::Done => break,
                StepOutcome::Continue => {}
            }
        }
    }

    /// Evaluator wrapper: is `axis` already at its goal value?
    pub fn axis_reached(
        &self,
        snapshot: &ActorSnapshot,
        config: &EngineConfig,
        axis: AttributeAxis,
    ) -> bool {
        let ctx = EvalCtx {
            snapshot,
            goal: self.goal.as_ref(),
            locks: &self.locks,
            config,
        };
        eval::axis_reached(&ctx, axis)
    }

    /// Evaluator wrapper: is `axis` shut out by a cross-axis lock?
    pub fn axis_locked(
        &self,
        snapshot: &ActorSnapshot,
        config: &EngineConfig,
        axis: AttributeAxis,
    ) -> bool {
        let ctx = EvalCtx {
            snapshot,
            goal: self.goal.as_ref(),
            locks: &self.locks,
            config,
        };
        eval::axis_locked(&ctx, axis)
    }

    /// Every axis idle with its live value at the goal value
    pub fn is_converged(&self, snapshot: &ActorSnapshot, config: &EngineConfig) -> bool {
        let ctx = EvalCtx {
            snapshot,
            goal: self.goal.as_ref(),
            locks: &self.locks,
            config,
        };
        AXIS_ORDER.iter().all(|&axis| {
            self.cursors[axis.index()].phase == AxisPhase::Idle && eval::axis_reached(&ctx, axis)
        })
    }

    /// The converged state's name; None while transitioning (there is
    /// no stable "current" mid-flight)
    pub fn current_state_name(
        &self,
        snapshot: &ActorSnapshot,
        config: &EngineConfig,
    ) -> Option<&str> {
        if self.is_converged(snapshot, config) {
            self.goal_name()
        } else {
            None
        }
    }

    /// Axes blocked past the configured warning threshold
    pub fn stalled_axes(&self, now: Tick, config: &EngineConfig) -> Vec<BlockedAxisReport> {
        AXIS_ORDER
            .iter()
            .filter_map(|&axis| {
                let cursor = &self.cursors[axis.index()];
                let since = cursor.blocked_since?;
                let blocked_ticks = now.saturating_sub(since);
                (cursor.phase == AxisPhase::Blocked
                    && blocked_ticks >= config.blocked_warn_ticks as u64)
                    .then_some(BlockedAxisReport {
                        axis,
                        since,
                        blocked_ticks,
                    })
            })
            .collect()
    }
}

enum StepOutcome {
    Done,
    /// The axis value advanced; re-run the pass for this axis
    Continue,
}

#[allow(clippy::too_many_arguments)]
fn step_axis(
    goal: &Goal,
    cursor: &mut AxisCursor,
    locks: &mut LockSet,
    stats: &mut TransitionStats,
    axis: AttributeAxis,
    actor: ActorId,
    snapshot: &ActorSnapshot,
    motion: &mut dyn MotionInterface,
    now: Tick,
    config: &EngineConfig,
) -> StepOutcome {
    let reached = {
        let ctx = EvalCtx {
            snapshot,
            goal: Some(goal),
            locks,
            config,
        };
        eval::axis_reached(&ctx, axis)
    };

    if reached {
        if cursor.phase == AxisPhase::Advancing {
            finish_action(cursor, locks, stats, motion, actor, false);
        }
        cursor.phase = AxisPhase::Idle;
        cursor.clear_blocked();
        return StepOutcome::Done;
    }

    match cursor.phase {
        AxisPhase::Advancing => {
            let precondition_holds = {
                let ctx = EvalCtx {
                    snapshot,
                    goal: Some(goal),
                    locks,
                    config,
                };
                cursor
                    .active
                    .as_ref()
                    .map_or(false, |a| a.precondition_holds(&ctx, axis))
            };

            if !precondition_holds {
                // The edge is no longer the right one (or no longer
                // legal); finish it and pick again.
                finish_action(cursor, locks, stats, motion, actor, true);
                try_start(goal, cursor, locks, stats, axis, actor, snapshot, motion, now, config);
                StepOutcome::Done
            } else if eval::action_complete(motion, actor, axis) {
                // The live value advanced one edge; finish and re-run
                // this axis's pass so the next edge can start in the
                // same frame.
                finish_action(cursor, locks, stats, motion, actor, false);
                StepOutcome::Continue
            } else {
                // Still in flight. The command was already issued;
                // there is nothing to re-issue.
                StepOutcome::Done
            }
        }
        AxisPhase::Idle | AxisPhase::Blocked => {
            try_start(goal, cursor, locks, stats, axis, actor, snapshot, motion, now, config);
            StepOutcome::Done
        }
    }
}

/// Start pairing partner: release the lock, clear the cursor
///
/// `forced` marks cancellation paths (goal replaced, precondition
/// lost). A forcibly cancelled clip is stopped so the animation layer
/// idles; everything else is superseded by the next command anyway.
fn finish_action(
    cursor: &mut AxisCursor,
    locks: &mut LockSet,
    stats: &mut TransitionStats,
    motion: &mut dyn MotionInterface,
    actor: ActorId,
    forced: bool,
) {
    if let Some(active) = cursor.active.take() {
        if let Some(group) = active.lock {
            locks.release(group, active.command.axis());
        }
        if forced {
            if let MotionCommand::PlayClip(_) = active.command {
                motion.set_animation_state(actor, None);
            }
        }
        stats.finishes += 1;
    }
    cursor.phase = AxisPhase::Idle;
}

#[allow(clippy::too_many_arguments)]
fn try_start(
    goal: &Goal,
    cursor: &mut AxisCursor,
    locks: &mut LockSet,
    stats: &mut TransitionStats,
    axis: AttributeAxis,
    actor: ActorId,
    snapshot: &ActorSnapshot,
    motion: &mut dyn MotionInterface,
    now: Tick,
    config: &EngineConfig,
) {
    let Some((command, guard)) = action::next_edge(axis, snapshot, goal) else {
        // Goal not reached but no edge: a dead end in the axis graph.
        enter_blocked(cursor, axis, now, config);
        return;
    };

    let blocked = {
        let ctx = EvalCtx {
            snapshot,
            goal: Some(goal),
            locks,
            config,
        };
        eval::axis_locked(&ctx, axis) || !guard.holds(snapshot)
    };
    if blocked {
        enter_blocked(cursor, axis, now, config);
        return;
    }

    let lock = action::effective_lock(axis, goal.flags());
    if let Some(group) = lock {
        if !locks.acquire(group, axis) {
            enter_blocked(cursor, axis, now, config);
            return;
        }
    }

    action::issue(motion, actor, &command, goal);
    stats.starts += 1;
    cursor.active = Some(ActiveAction {
        command,
        guard,
        lock,
        started_tick: now,
    });
    cursor.phase = AxisPhase::Advancing;
    cursor.clear_blocked();
    cursor.last_advance_tick = now;
}

fn enter_blocked(cursor: &mut AxisCursor, axis: AttributeAxis, now: Tick, config: &EngineConfig) {
    if cursor.phase != AxisPhase::Blocked {
        cursor.phase = AxisPhase::Blocked;
        cursor.blocked_since = Some(now);
        cursor.warned = false;
        tracing::debug!(axis = %axis, "axis blocked");
        return;
    }

    if let Some(since) = cursor.blocked_since {
        let blocked_ticks = now.saturating_sub(since);
        if !cursor.warned && blocked_ticks >= config.blocked_warn_ticks as u64 {
            cursor.warned = true;
            tracing::warn!(axis = %axis, blocked_ticks, "axis blocked past threshold");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{MentalState, Movement, Posture, WeaponState};
    use crate::motion::SimulatedMotion;

    struct Rig {
        actor: ActorId,
        manager: StateManager,
        snapshot: ActorSnapshot,
        motion: SimulatedMotion,
        registry: StateRegistry,
        config: EngineConfig,
        now: Tick,
    }

    impl Rig {
        fn new(latency: u32) -> Self {
            Self {
                actor: ActorId::new(),
                manager: StateManager::new(),
                snapshot: ActorSnapshot::new(),
                motion: SimulatedMotion::new(latency),
                registry: StateRegistry::with_defaults(),
                config: EngineConfig::default(),
                now: 0,
            }
        }

        fn request(&mut self, name: &str) -> crate::core::error::Result<()> {
            self.manager.request_state(
                &self.registry,
                name,
                StateOverrides::default(),
                &mut self.motion,
                self.actor,
            )
        }

        fn tick(&mut self) {
            self.now += 1;
            self.motion.advance(&mut self.snapshot);
            self.manager.tick(
                self.actor,
                &self.snapshot,
                &mut self.motion,
                self.now,
                &self.config,
            );
        }

        fn run_until_converged(&mut self, max_ticks: u32) -> u32 {
            for i in 0..max_ticks {
                if self.manager.is_converged(&self.snapshot, &self.config) {
                    return i;
                }
                self.tick();
            }
            panic!(
                "no convergence to {:?} within {} ticks",
                self.manager.goal_name(),
                max_ticks
            );
        }
    }

    #[test]
    fn test_no_goal_is_converged() {
        let rig = Rig::new(1);
        assert!(rig.manager.is_converged(&rig.snapshot, &rig.config));
        assert_eq!(rig.manager.current_state_name(&rig.snapshot, &rig.config), None);
    }

    #[test]
    fn test_two_axes_advance_same_tick_without_shared_lock() {
        // Posture and Mental take different (or no) locks, so both
        // start in the first pass and finish in the second.
        let mut rig = Rig::new(1);
        rig.request("crouch_danger").unwrap();

        rig.tick();
        assert_eq!(rig.manager.phase(AttributeAxis::Posture), AxisPhase::Advancing);
        assert_eq!(rig.manager.phase(AttributeAxis::Mental), AxisPhase::Advancing);

        rig.tick();
        assert!(rig.manager.is_converged(&rig.snapshot, &rig.config));
        assert_eq!(rig.snapshot.posture, Posture::Crouch);
        assert_eq!(rig.snapshot.mental, MentalState::Danger);
        assert_eq!(
            rig.manager.current_state_name(&rig.snapshot, &rig.config),
            Some("crouch_danger")
        );
    }

    #[test]
    fn test_multi_hop_convergence() {
        let mut rig = Rig::new(1);
        rig.request("prone_sniper").unwrap();
        rig.run_until_converged(40);

        assert_eq!(rig.snapshot.posture, Posture::Prone);
        assert_eq!(rig.snapshot.weapon, WeaponState::SniperAim);
        assert_eq!(rig.snapshot.mental, MentalState::FiringCombat);

        let stats = rig.manager.stats();
        assert_eq!(stats.starts, stats.finishes);
        assert_eq!(stats.cancellations, 0);
    }

    #[test]
    fn test_every_builtin_state_converges_from_default() {
        let registry = StateRegistry::with_defaults();
        for name in registry.names() {
            let mut rig = Rig::new(1);
            rig.request(name).unwrap();
            rig.run_until_converged(60);
        }
    }

    #[test]
    fn test_request_same_goal_is_noop() {
        let mut rig = Rig::new(1);
        rig.request("crouch_danger").unwrap();
        rig.run_until_converged(20);

        let stats_before = rig.manager.stats();
        rig.request("crouch_danger").unwrap();
        rig.tick();

        assert_eq!(rig.manager.stats(), stats_before);
        assert!(rig.manager.is_converged(&rig.snapshot, &rig.config));
    }

    #[test]
    fn test_unknown_state_keeps_goal_and_cursors() {
        let mut rig = Rig::new(1);
        rig.request("patrol_walk").unwrap();
        rig.tick();

        let phases: Vec<_> = AXIS_ORDER.iter().map(|&a| rig.manager.phase(a)).collect();
        let stats_before = rig.manager.stats();

        let err = rig.request("nonexistent_state").unwrap_err();
        assert!(matches!(err, ComposureError::UnknownState(_)));
        assert_eq!(rig.manager.goal_name(), Some("patrol_walk"));
        assert_eq!(
            AXIS_ORDER.iter().map(|&a| rig.manager.phase(a)).collect::<Vec<_>>(),
            phases
        );
        assert_eq!(rig.manager.stats(), stats_before);
    }

    #[test]
    fn test_goal_change_cancels_each_advancing_axis_once() {
        let mut rig = Rig::new(5);
        rig.request("crouch_danger").unwrap();
        rig.tick();

        let advancing = rig.manager.advancing_axes();
        assert_eq!(advancing.len(), 2);
        let stats_before = rig.manager.stats();

        rig.request("idle_relaxed").unwrap();
        let stats = rig.manager.stats();
        assert_eq!(stats.cancellations, stats_before.cancellations + advancing.len() as u64);
        assert_eq!(stats.finishes, stats_before.finishes + advancing.len() as u64);
        assert!(rig.manager.advancing_axes().is_empty());

        rig.run_until_converged(30);
    }

    #[test]
    fn test_posture_waits_for_movement_to_stop() {
        // From a run, going prone must stop the legs first: the
        // posture axis sits Blocked on its guard until movement lands
        // on Stand.
        let mut rig = Rig::new(2);
        rig.snapshot.movement = Movement::Run;
        rig.request("hide_prone").unwrap();

        rig.tick();
        assert_eq!(rig.manager.phase(AttributeAxis::Posture), AxisPhase::Blocked);
        assert_eq!(rig.manager.phase(AttributeAxis::Movement), AxisPhase::Advancing);

        rig.run_until_converged(40);
        assert_eq!(rig.snapshot.posture, Posture::Prone);
        assert_eq!(rig.snapshot.movement, Movement::Stand);
    }

    #[test]
    fn test_blocked_axis_surfaces_after_threshold() {
        // Overriding the weapon to SniperAim while the goal keeps the
        // actor mentally Free: the aim edge's guard (mental != Free)
        // can never hold. The axis must keep retrying every tick and
        // surface a report once past the threshold.
        let mut rig = Rig::new(1);
        rig.snapshot.weapon = WeaponState::Unstrapped;
        rig.manager
            .request_state(
                &rig.registry,
                "idle_relaxed",
                StateOverrides {
                    weapon: Some(WeaponState::SniperAim),
                    ..Default::default()
                },
                &mut rig.motion,
                rig.actor,
            )
            .unwrap();

        for _ in 0..(rig.config.blocked_warn_ticks + 5) {
            rig.tick();
        }

        assert_eq!(rig.manager.phase(AttributeAxis::Weapon), AxisPhase::Blocked);
        assert_eq!(rig.snapshot.mental, MentalState::Free);
        let stalled = rig.manager.stalled_axes(rig.now, &rig.config);
        assert_eq!(stalled.len(), 1);
        assert_eq!(stalled[0].axis, AttributeAxis::Weapon);
        assert!(stalled[0].blocked_ticks >= rig.config.blocked_warn_ticks as u64);
    }

    #[test]
    fn test_clear_goal_cancels_and_converges_empty() {
        let mut rig = Rig::new(5);
        rig.request("fire_standing").unwrap();
        rig.tick();
        assert!(!rig.manager.advancing_axes().is_empty());

        let (actor, motion) = (rig.actor, &mut rig.motion);
        rig.manager.clear_goal(motion, actor);

        assert!(rig.manager.is_converged(&rig.snapshot, &rig.config));
        let stats = rig.manager.stats();
        assert_eq!(stats.starts, stats.finishes);
    }
}
