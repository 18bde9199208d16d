//! Motion/animation interface boundary
//!
//! The core never moves an actor itself. Each action issues exactly one
//! fire-and-forget command through [`MotionInterface`]; the motion layer
//! applies the effect to the actor's snapshot when it finishes, and the
//! core observes completion by polling, never via callback.

use ahash::{AHashMap, AHashSet};

use crate::actor::snapshot::ActorSnapshot;
use crate::axis::{AttributeAxis, DirectionTarget, MentalState, Movement, Posture, WeaponState};
use crate::core::types::{ActorId, ClipId, TargetRef};

/// The consumed motion/animation boundary
///
/// Setters are fire-and-forget; `command_complete` reports whether the
/// last command issued for an axis has finished (and its effect has been
/// written to the snapshot). Issuing a new command for an axis resets
/// that axis's completion state.
pub trait MotionInterface {
    fn set_body_posture(&mut self, actor: ActorId, posture: Posture);
    fn set_movement_type(&mut self, actor: ActorId, movement: Movement);
    fn set_mental_state(&mut self, actor: ActorId, mental: MentalState);
    fn set_weapon_item(&mut self, actor: ActorId, weapon: WeaponState, item: Option<TargetRef>);
    fn set_animation_state(&mut self, actor: ActorId, clip: Option<ClipId>);
    fn turn_toward(&mut self, actor: ActorId, target: DirectionTarget);

    /// Has the last command issued for `axis` finished?
    fn command_complete(&self, actor: ActorId, axis: AttributeAxis) -> bool;
}

#[derive(Debug, Clone)]
enum PendingEffect {
    Posture(Posture),
    Movement(Movement),
    Mental(MentalState),
    Weapon(WeaponState),
    Animation(Option<ClipId>),
    Turn(DirectionTarget),
}

#[derive(Debug, Clone)]
struct PendingCommand {
    effect: PendingEffect,
    remaining: u32,
}

/// A motion layer model for hosts without a real one
///
/// Every command takes a fixed number of ticks, then its effect is
/// written to the snapshot by [`SimulatedMotion::advance`], which the
/// host calls once per frame before the orchestrator pass. One actor
/// per instance; the world harness owns one per actor entry.
#[derive(Debug, Clone)]
pub struct SimulatedMotion {
    /// Ticks every command takes to complete
    latency_ticks: u32,
    pending: AHashMap<AttributeAxis, PendingCommand>,
    done: AHashSet<AttributeAxis>,
    /// Commands issued since construction
    commands_issued: u64,
}

impl SimulatedMotion {
    pub fn new(latency_ticks: u32) -> Self {
        Self {
            latency_ticks,
            pending: AHashMap::new(),
            done: AHashSet::new(),
            commands_issued: 0,
        }
    }

    /// Commands issued since construction
    pub fn commands_issued(&self) -> u64 {
        self.commands_issued
    }

    /// Is any command still in flight?
    pub fn busy(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Advance in-flight commands by one tick, applying finished
    /// effects to the snapshot
    pub fn advance(&mut self, snapshot: &mut ActorSnapshot) {
        let finished: Vec<AttributeAxis> = self
            .pending
            .iter_mut()
            .filter_map(|(axis, cmd)| {
                if cmd.remaining > 0 {
                    cmd.remaining -= 1;
                }
                (cmd.remaining == 0).then_some(*axis)
            })
            .collect();

        for axis in finished {
            if let Some(cmd) = self.pending.remove(&axis) {
                apply_effect(snapshot, cmd.effect);
                self.done.insert(axis);
            }
        }
    }

    fn issue(&mut self, axis: AttributeAxis, effect: PendingEffect) {
        self.commands_issued += 1;
        self.done.remove(&axis);
        if self.latency_ticks == 0 {
            // Instant motion still completes on the next advance() so
            // completion is observed one frame after issue, like a real
            // motion layer.
            self.pending.insert(axis, PendingCommand { effect, remaining: 1 });
        } else {
            self.pending.insert(
                axis,
                PendingCommand {
                    effect,
                    remaining: self.latency_ticks,
                },
            );
        }
    }
}

fn apply_effect(snapshot: &mut ActorSnapshot, effect: PendingEffect) {
    match effect {
        PendingEffect::Posture(p) => snapshot.posture = p,
        PendingEffect::Movement(m) => snapshot.movement = m,
        PendingEffect::Mental(m) => snapshot.mental = m,
        PendingEffect::Weapon(w) => snapshot.weapon = w,
        PendingEffect::Animation(clip) => snapshot.animation = clip,
        PendingEffect::Turn(DirectionTarget::Bearing(b)) => {
            snapshot.bearing = b;
            snapshot.tracking = None;
        }
        PendingEffect::Turn(DirectionTarget::LookAt(target)) => {
            snapshot.tracking = Some(target);
        }
    }
}

impl MotionInterface for SimulatedMotion {
    fn set_body_posture(&mut self, _actor: ActorId, posture: Posture) {
        self.issue(AttributeAxis::Posture, PendingEffect::Posture(posture));
    }

    fn set_movement_type(&mut self, _actor: ActorId, movement: Movement) {
        self.issue(AttributeAxis::Movement, PendingEffect::Movement(movement));
    }

    fn set_mental_state(&mut self, _actor: ActorId, mental: MentalState) {
        self.issue(AttributeAxis::Mental, PendingEffect::Mental(mental));
    }

    fn set_weapon_item(&mut self, _actor: ActorId, weapon: WeaponState, _item: Option<TargetRef>) {
        self.issue(AttributeAxis::Weapon, PendingEffect::Weapon(weapon));
    }

    fn set_animation_state(&mut self, _actor: ActorId, clip: Option<ClipId>) {
        self.issue(AttributeAxis::Animation, PendingEffect::Animation(clip));
    }

    fn turn_toward(&mut self, _actor: ActorId, target: DirectionTarget) {
        self.issue(AttributeAxis::Direction, PendingEffect::Turn(target));
    }

    fn command_complete(&self, _actor: ActorId, axis: AttributeAxis) -> bool {
        self.done.contains(&axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Bearing;

    #[test]
    fn test_command_applies_after_latency() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(2);
        let mut snapshot = ActorSnapshot::new();

        motion.set_body_posture(actor, Posture::Crouch);
        assert!(!motion.command_complete(actor, AttributeAxis::Posture));

        motion.advance(&mut snapshot);
        assert_eq!(snapshot.posture, Posture::Stand);
        assert!(!motion.command_complete(actor, AttributeAxis::Posture));

        motion.advance(&mut snapshot);
        assert_eq!(snapshot.posture, Posture::Crouch);
        assert!(motion.command_complete(actor, AttributeAxis::Posture));
    }

    #[test]
    fn test_zero_latency_completes_next_advance() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(0);
        let mut snapshot = ActorSnapshot::new();

        motion.set_movement_type(actor, Movement::Walk);
        motion.advance(&mut snapshot);
        assert_eq!(snapshot.movement, Movement::Walk);
        assert!(motion.command_complete(actor, AttributeAxis::Movement));
    }

    #[test]
    fn test_new_command_resets_completion() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(1);
        let mut snapshot = ActorSnapshot::new();

        motion.set_mental_state(actor, MentalState::Danger);
        motion.advance(&mut snapshot);
        assert!(motion.command_complete(actor, AttributeAxis::Mental));

        motion.set_mental_state(actor, MentalState::FiringCombat);
        assert!(!motion.command_complete(actor, AttributeAxis::Mental));
    }

    #[test]
    fn test_axes_complete_independently() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(1);
        let mut snapshot = ActorSnapshot::new();

        motion.set_body_posture(actor, Posture::Crouch);
        motion.set_mental_state(actor, MentalState::Danger);
        motion.advance(&mut snapshot);

        assert!(motion.command_complete(actor, AttributeAxis::Posture));
        assert!(motion.command_complete(actor, AttributeAxis::Mental));
        assert_eq!(snapshot.posture, Posture::Crouch);
        assert_eq!(snapshot.mental, MentalState::Danger);
    }

    #[test]
    fn test_turn_to_bearing_clears_tracking() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(1);
        let mut snapshot = ActorSnapshot::new();
        snapshot.tracking = Some(TargetRef::new());

        motion.turn_toward(actor, DirectionTarget::Bearing(Bearing::new(90.0)));
        motion.advance(&mut snapshot);

        assert_eq!(snapshot.bearing, Bearing::new(90.0));
        assert!(snapshot.tracking.is_none());
    }

    #[test]
    fn test_command_counter() {
        let actor = ActorId::new();
        let mut motion = SimulatedMotion::new(1);
        assert_eq!(motion.commands_issued(), 0);
        motion.set_body_posture(actor, Posture::Crouch);
        motion.set_animation_state(actor, Some(ClipId::new("clip")));
        assert_eq!(motion.commands_issued(), 2);
    }
}
