//! Shared flat handle namespace for the host's execution engine
//!
//! The host's goal-directed scheduler references every behavioral
//! subsystem's evaluators and actions through one flat integer address
//! space. Collision in that space silently aliases two unrelated
//! behaviors, so ranges are reserved per subsystem and validated at
//! registration: a typed registry (subsystem + local index) underneath,
//! small integer handles outside.

use crate::actor::snapshot::ActorSnapshot;
use crate::axis::{AttributeAxis, AXIS_COUNT};
use crate::core::config::EngineConfig;
use crate::core::error::{ComposureError, Result};
use crate::core::types::{ActorId, Tick};
use crate::eval;
use crate::manager::StateManager;
use crate::motion::MotionInterface;

/// A contiguous block of handles owned by one subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRange {
    pub base: u32,
    pub len: u32,
}

impl HandleRange {
    pub fn end(&self) -> u32 {
        self.base + self.len
    }

    pub fn contains(&self, handle: u32) -> bool {
        handle >= self.base && handle < self.end()
    }

    /// Flat handle for a local index. Callers stay within `len`; the
    /// typed wrappers below do.
    pub fn handle(&self, local: u32) -> u32 {
        debug_assert!(local < self.len);
        self.base + local
    }

    /// Local index for a flat handle, if it falls in this range
    pub fn local(&self, handle: u32) -> Option<u32> {
        self.contains(handle).then(|| handle - self.base)
    }

    fn overlaps(&self, other: &HandleRange) -> bool {
        self.base < other.end() && other.base < self.end()
    }
}

/// Registration-time range table for the whole process
///
/// Every subsystem reserves its block here before handing handles to
/// the scheduler; overlapping reservations fail fast.
#[derive(Debug, Default)]
pub struct HandleSpace {
    ranges: Vec<(String, HandleRange)>,
}

impl HandleSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `[base, base + len)` for `subsystem`
    pub fn reserve(&mut self, subsystem: &str, base: u32, len: u32) -> Result<HandleRange> {
        let range = HandleRange { base, len };
        for (owner, reserved) in &self.ranges {
            if reserved.overlaps(&range) {
                return Err(ComposureError::IdCollision {
                    subsystem: subsystem.to_string(),
                    other: owner.clone(),
                    base,
                    end: range.end(),
                });
            }
        }
        self.ranges.push((subsystem.to_string(), range));
        Ok(range)
    }

    /// Which subsystem owns a handle, and at which local index
    pub fn owner_of(&self, handle: u32) -> Option<(&str, u32)> {
        self.ranges.iter().find_map(|(owner, range)| {
            range.local(handle).map(|local| (owner.as_str(), local))
        })
    }
}

/// Evaluators this core exposes to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvaluator {
    AxisReached(AttributeAxis),
    AxisLocked(AttributeAxis),
    ActionComplete(AttributeAxis),
    Converged,
}

impl CoreEvaluator {
    pub const COUNT: u32 = 3 * AXIS_COUNT as u32 + 1;

    fn local(&self) -> u32 {
        match self {
            CoreEvaluator::AxisReached(axis) => axis.index() as u32,
            CoreEvaluator::AxisLocked(axis) => AXIS_COUNT as u32 + axis.index() as u32,
            CoreEvaluator::ActionComplete(axis) => 2 * AXIS_COUNT as u32 + axis.index() as u32,
            CoreEvaluator::Converged => 3 * AXIS_COUNT as u32,
        }
    }

    fn from_local(local: u32) -> Option<Self> {
        let axis_count = AXIS_COUNT as u32;
        let axis = AttributeAxis::from_index((local % axis_count) as usize);
        match local / axis_count {
            0 => axis.map(CoreEvaluator::AxisReached),
            1 => axis.map(CoreEvaluator::AxisLocked),
            2 => axis.map(CoreEvaluator::ActionComplete),
            3 if local == 3 * axis_count => Some(CoreEvaluator::Converged),
            _ => None,
        }
    }
}

/// Actions this core exposes: one per-axis advance step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreAction {
    Advance(AttributeAxis),
}

impl CoreAction {
    pub const COUNT: u32 = AXIS_COUNT as u32;

    fn local(&self) -> u32 {
        let CoreAction::Advance(axis) = self;
        axis.index() as u32
    }

    fn from_local(local: u32) -> Option<Self> {
        AttributeAxis::from_index(local as usize).map(CoreAction::Advance)
    }
}

/// This core's reserved block and its typed handle mapping
#[derive(Debug, Clone, Copy)]
pub struct CoreHandles {
    evaluators: HandleRange,
    actions: HandleRange,
}

impl CoreHandles {
    /// Handles this core needs in total
    pub const BLOCK_LEN: u32 = CoreEvaluator::COUNT + CoreAction::COUNT;

    /// Reserve this core's block at `base`
    pub fn register(space: &mut HandleSpace, base: u32) -> Result<Self> {
        let evaluators = space.reserve("composure/evaluators", base, CoreEvaluator::COUNT)?;
        let actions = space.reserve(
            "composure/actions",
            base + CoreEvaluator::COUNT,
            CoreAction::COUNT,
        )?;
        Ok(Self {
            evaluators,
            actions,
        })
    }

    pub fn evaluator_handle(&self, evaluator: CoreEvaluator) -> u32 {
        self.evaluators.handle(evaluator.local())
    }

    pub fn action_handle(&self, action: CoreAction) -> u32 {
        self.actions.handle(action.local())
    }

    pub fn evaluator(&self, handle: u32) -> Option<CoreEvaluator> {
        self.evaluators.local(handle).and_then(CoreEvaluator::from_local)
    }

    pub fn action(&self, handle: u32) -> Option<CoreAction> {
        self.actions.local(handle).and_then(CoreAction::from_local)
    }

    /// Scheduler entry: evaluate one of this core's predicates
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        handle: u32,
        manager: &StateManager,
        snapshot: &ActorSnapshot,
        motion: &dyn MotionInterface,
        actor: ActorId,
        config: &EngineConfig,
    ) -> Result<bool> {
        let evaluator = self
            .evaluator(handle)
            .ok_or(ComposureError::UnknownHandle(handle))?;

        Ok(match evaluator {
            CoreEvaluator::AxisReached(axis) => manager.axis_reached(snapshot, config, axis),
            CoreEvaluator::AxisLocked(axis) => manager.axis_locked(snapshot, config, axis),
            CoreEvaluator::ActionComplete(axis) => eval::action_complete(motion, actor, axis),
            CoreEvaluator::Converged => manager.is_converged(snapshot, config),
        })
    }

    /// Scheduler entry: drive one of this core's per-axis actions
    #[allow(clippy::too_many_arguments)]
    pub fn drive(
        &self,
        handle: u32,
        manager: &mut StateManager,
        snapshot: &ActorSnapshot,
        motion: &mut dyn MotionInterface,
        actor: ActorId,
        now: Tick,
        config: &EngineConfig,
    ) -> Result<()> {
        let CoreAction::Advance(axis) = self
            .action(handle)
            .ok_or(ComposureError::UnknownHandle(handle))?;
        manager.tick_axis(axis, actor, snapshot, motion, now, config);
        Ok(())
    }
}
