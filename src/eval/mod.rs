//! Evaluators - stateless predicates over an actor's live state
//!
//! Evaluators are pure reads: evaluating the same predicate twice in
//! one tick with no intervening mutation yields the same result. The
//! single exception to "reads the snapshot" is [`action_complete`],
//! which polls the motion interface's transient completion state.

use crate::actor::snapshot::ActorSnapshot;
use crate::axis::locks::LockSet;
use crate::axis::{AttributeAxis, DirectionTarget};
use crate::core::config::EngineConfig;
use crate::core::types::ActorId;
use crate::manager::goal::Goal;
use crate::motion::MotionInterface;

/// Everything an evaluator may read
#[derive(Clone, Copy)]
pub struct EvalCtx<'a> {
    pub snapshot: &'a ActorSnapshot,
    /// No goal means nothing is requested: every axis counts as reached
    pub goal: Option<&'a Goal>,
    pub locks: &'a LockSet,
    pub config: &'a EngineConfig,
}

/// Is the actor's live value for `axis` already at the goal's value?
///
/// Axes the goal leaves unspecified are trivially reached.
pub fn axis_reached(ctx: &EvalCtx, axis: AttributeAxis) -> bool {
    let Some(goal) = ctx.goal else { return true };

    match axis {
        AttributeAxis::Direction => match goal.target_direction() {
            None => true,
            Some(DirectionTarget::Bearing(target)) => {
                ctx.snapshot.bearing.distance(target) <= ctx.config.direction_tolerance_deg
            }
            Some(DirectionTarget::LookAt(target)) => ctx.snapshot.tracking == Some(target),
        },
        AttributeAxis::Posture => goal
            .target_posture()
            .map_or(true, |p| ctx.snapshot.posture == p),
        AttributeAxis::Movement => goal
            .target_movement()
            .map_or(true, |m| ctx.snapshot.movement == m),
        AttributeAxis::Weapon => goal
            .target_weapon()
            .map_or(true, |w| ctx.snapshot.weapon == w),
        AttributeAxis::Mental => goal
            .target_mental()
            .map_or(true, |m| ctx.snapshot.mental == m),
        AttributeAxis::Animation => goal
            .target_animation()
            .map_or(true, |clip| ctx.snapshot.animation.as_ref() == Some(clip)),
    }
}

/// Is `axis` currently shut out by a cross-axis lock another axis holds?
///
/// Goal flags can waive the lock: a forced weapon change ignores the
/// weapon-hands lock, a lock-skipping turn ignores the skeletal root.
pub fn axis_locked(ctx: &EvalCtx, axis: AttributeAxis) -> bool {
    let flags = ctx.goal.map(|g| g.flags()).unwrap_or_default();
    if crate::action::effective_lock(axis, flags).is_none() {
        return false;
    }
    ctx.locks.locked_out(axis)
}

/// Has the command issued for `axis` finished on the motion side?
pub fn action_complete(
    motion: &dyn MotionInterface,
    actor: ActorId,
    axis: AttributeAxis,
) -> bool {
    motion.command_complete(actor, axis)
}

/// All axes reached (the convergence predicate over values alone)
pub fn all_axes_reached(ctx: &EvalCtx) -> bool {
    crate::axis::AXIS_ORDER.iter().all(|&axis| axis_reached(ctx, axis))
}
