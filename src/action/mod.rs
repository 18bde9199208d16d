//! Atomic actions - one per graph edge
//!
//! Rather than one small class per edge, every edge runs through the
//! same lifecycle with edge data looked up from the graphs: a command
//! to issue, a guard to hold, a lock to take. The orchestrator enforces
//! the start/finish pairing; the data here only says what starting and
//! finishing mean for a given edge.

use serde::{Deserialize, Serialize};

use crate::actor::snapshot::ActorSnapshot;
use crate::axis::graph::{self, EdgeGuard};
use crate::axis::locks::{lock_group, LockGroup};
use crate::axis::{AttributeAxis, DirectionTarget, MentalState, Movement, Posture, WeaponState};
use crate::core::types::{ActorId, ClipId, Tick};
use crate::eval::{self, EvalCtx};
use crate::manager::goal::Goal;
use crate::motion::MotionInterface;

/// The motion-side effect of one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    SetPosture(Posture),
    SetMovement(Movement),
    SetWeapon(WeaponState),
    SetMental(MentalState),
    Turn(DirectionTarget),
    PlayClip(ClipId),
    StopClip,
}

impl MotionCommand {
    /// The axis this command advances
    pub fn axis(&self) -> AttributeAxis {
        match self {
            MotionCommand::SetPosture(_) => AttributeAxis::Posture,
            MotionCommand::SetMovement(_) => AttributeAxis::Movement,
            MotionCommand::SetWeapon(_) => AttributeAxis::Weapon,
            MotionCommand::SetMental(_) => AttributeAxis::Mental,
            MotionCommand::Turn(_) => AttributeAxis::Direction,
            MotionCommand::PlayClip(_) | MotionCommand::StopClip => AttributeAxis::Animation,
        }
    }
}

/// Issue a command to the motion interface (fire-and-forget)
pub fn issue(
    motion: &mut dyn MotionInterface,
    actor: ActorId,
    command: &MotionCommand,
    goal: &Goal,
) {
    match command {
        MotionCommand::SetPosture(p) => motion.set_body_posture(actor, *p),
        MotionCommand::SetMovement(m) => motion.set_movement_type(actor, *m),
        MotionCommand::SetWeapon(w) => motion.set_weapon_item(actor, *w, goal.weapon_item()),
        MotionCommand::SetMental(m) => motion.set_mental_state(actor, *m),
        MotionCommand::Turn(target) => motion.turn_toward(actor, *target),
        MotionCommand::PlayClip(clip) => motion.set_animation_state(actor, Some(clip.clone())),
        MotionCommand::StopClip => motion.set_animation_state(actor, None),
    }
}

/// The one edge that makes progress on `axis` toward the goal
///
/// None when the axis is already at its goal value, the goal leaves it
/// unspecified, or no route exists (a dead end - the axis will sit
/// Blocked until the goal changes).
pub fn next_edge(axis: AttributeAxis, snapshot: &ActorSnapshot, goal: &Goal) -> Option<(MotionCommand, EdgeGuard)> {
    match axis {
        AttributeAxis::Posture => {
            let target = goal.target_posture()?;
            let next = graph::next_posture(snapshot.posture, target)?;
            Some((MotionCommand::SetPosture(next), graph::posture_guard(next)))
        }
        AttributeAxis::Movement => {
            let target = goal.target_movement()?;
            let next = graph::next_movement(snapshot.movement, target)?;
            Some((MotionCommand::SetMovement(next), graph::movement_guard(next)))
        }
        AttributeAxis::Weapon => {
            let target = goal.target_weapon()?;
            let next = graph::next_weapon(snapshot.weapon, target)?;
            Some((MotionCommand::SetWeapon(next), graph::weapon_guard(next)))
        }
        AttributeAxis::Mental => {
            let target = goal.target_mental()?;
            let next = graph::next_mental(snapshot.mental, target)?;
            Some((MotionCommand::SetMental(next), EdgeGuard::Always))
        }
        AttributeAxis::Direction => {
            let target = goal.target_direction()?;
            Some((MotionCommand::Turn(target), EdgeGuard::Always))
        }
        AttributeAxis::Animation => {
            let clip = goal.target_animation()?;
            Some((MotionCommand::PlayClip(clip.clone()), EdgeGuard::Always))
        }
    }
}

/// The lock an action on `axis` must hold, after goal flags
///
/// `force_weapon` waives the weapon-hands lock for the weapon axis;
/// `skip_direction_lock` waives the skeletal root for the direction
/// axis. A waived lock is neither respected nor taken.
pub fn effective_lock(
    axis: AttributeAxis,
    flags: crate::registry::DescriptorFlags,
) -> Option<LockGroup> {
    match axis {
        AttributeAxis::Weapon if flags.force_weapon => None,
        AttributeAxis::Direction if flags.skip_direction_lock => None,
        _ => lock_group(axis),
    }
}

/// Bookkeeping for the action currently advancing one axis
///
/// Created by start, destroyed by finish; the cursor holding it pairs
/// the two on every path.
#[derive(Debug, Clone)]
pub struct ActiveAction {
    pub command: MotionCommand,
    pub guard: EdgeGuard,
    pub lock: Option<LockGroup>,
    pub started_tick: Tick,
}

impl ActiveAction {
    /// Does this action's precondition still hold?
    ///
    /// Conjunction of not-locked-out, not-already-reached, and the
    /// edge guard.
    pub fn precondition_holds(&self, ctx: &EvalCtx, axis: AttributeAxis) -> bool {
        !eval::axis_locked(ctx, axis)
            && !eval::axis_reached(ctx, axis)
            && self.guard.holds(ctx.snapshot)
    }
}
