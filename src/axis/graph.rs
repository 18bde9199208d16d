//! Per-axis transition graphs
//!
//! Each axis is a small hand-authored graph of legal one-step
//! transitions. The graphs are routing tables, not searched structures:
//! `next_*` answers "which single value do I step to next, given where I
//! am and where I want to be", and multi-hop transitions emerge from
//! repeated one-hop lookups as the live value advances tick over tick.
//!
//! Row order is the tie-break priority: the first matching row wins, so
//! edge selection is deterministic and two equally-valid intermediate
//! values can never cause oscillation.

use super::{MentalState, Movement, Posture, WeaponState};
use crate::actor::snapshot::ActorSnapshot;

/// One routing row: at `from`, heading for `goal`, step to `next`
type Hop<V> = (V, V, V);

fn next_hop<V: PartialEq + Copy>(table: &[Hop<V>], current: V, goal: V) -> Option<V> {
    if current == goal {
        return None;
    }
    table
        .iter()
        .find(|(from, to, _)| *from == current && *to == goal)
        .map(|(_, _, next)| *next)
}

/// Posture chain: Stand <-> Crouch <-> Prone
///
/// Prone always routes through Crouch; there is no direct
/// stand-to-prone drop.
const POSTURE_HOPS: &[Hop<Posture>] = {
    use Posture::*;
    &[
        (Stand, Crouch, Crouch),
        (Stand, Prone, Crouch),
        (Crouch, Prone, Prone),
        (Crouch, Stand, Stand),
        (Prone, Stand, Crouch),
        (Prone, Crouch, Crouch),
    ]
};

/// Gait chain: Stand <-> Walk <-> Run, with Sneak adjacent to Stand and
/// Walk. Run and Sneak route through Walk.
const MOVEMENT_HOPS: &[Hop<Movement>] = {
    use Movement::*;
    &[
        (Stand, Walk, Walk),
        (Stand, Run, Walk),
        (Stand, Sneak, Sneak),
        (Walk, Stand, Stand),
        (Walk, Run, Run),
        (Walk, Sneak, Sneak),
        (Run, Stand, Walk),
        (Run, Walk, Walk),
        (Run, Sneak, Walk),
        (Sneak, Stand, Stand),
        (Sneak, Walk, Walk),
        (Sneak, Run, Walk),
    ]
};

/// Weapon handling chain
///
/// Strapped -> Unstrapping -> Unstrapped -> {Firing | SniperAim |
/// Strapping -> Strapped}. A transit value always completes before the
/// axis reroutes, even when the goal flipped mid-handling.
const WEAPON_HOPS: &[Hop<WeaponState>] = {
    use WeaponState::*;
    &[
        (Strapped, Unstrapped, Unstrapping),
        (Strapped, Firing, Unstrapping),
        (Strapped, SniperAim, Unstrapping),
        (Unstrapping, Unstrapped, Unstrapped),
        (Unstrapping, Firing, Unstrapped),
        (Unstrapping, SniperAim, Unstrapped),
        (Unstrapping, Strapped, Unstrapped),
        (Unstrapped, Firing, Firing),
        (Unstrapped, SniperAim, SniperAim),
        (Unstrapped, Strapped, Strapping),
        (Strapping, Strapped, Strapped),
        (Strapping, Unstrapped, Strapped),
        (Strapping, Firing, Strapped),
        (Strapping, SniperAim, Strapped),
        (Firing, Unstrapped, Unstrapped),
        (Firing, SniperAim, Unstrapped),
        (Firing, Strapped, Unstrapped),
        (SniperAim, Unstrapped, Unstrapped),
        (SniperAim, Firing, Unstrapped),
        (SniperAim, Strapped, Unstrapped),
    ]
};

/// Alertness chain: Free <-> Danger <-> FiringCombat
///
/// The ends route through Danger; an actor never drops straight from a
/// firefight to relaxed.
const MENTAL_HOPS: &[Hop<MentalState>] = {
    use MentalState::*;
    &[
        (Free, Danger, Danger),
        (Free, FiringCombat, Danger),
        (Danger, FiringCombat, FiringCombat),
        (Danger, Free, Free),
        (FiringCombat, Free, Danger),
        (FiringCombat, Danger, Danger),
    ]
};

/// Next posture value toward `goal`, or None when already there
pub fn next_posture(current: Posture, goal: Posture) -> Option<Posture> {
    next_hop(POSTURE_HOPS, current, goal)
}

/// Next movement gait toward `goal`, or None when already there
pub fn next_movement(current: Movement, goal: Movement) -> Option<Movement> {
    next_hop(MOVEMENT_HOPS, current, goal)
}

/// Next weapon state toward `goal`, or None when already there
pub fn next_weapon(current: WeaponState, goal: WeaponState) -> Option<WeaponState> {
    next_hop(WEAPON_HOPS, current, goal)
}

/// Next mental state toward `goal`, or None when already there
pub fn next_mental(current: MentalState, goal: MentalState) -> Option<MentalState> {
    next_hop(MENTAL_HOPS, current, goal)
}

/// Edge-specific guard, checked on top of the lock and reached checks
///
/// Guards read the actor's live values on *other* axes, which is what
/// sequences cross-dependent transitions: posture waits for the legs to
/// stop before dropping prone, the gait waits for the body to rise
/// before breaking into a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeGuard {
    Always,
    /// Live movement must equal this gait
    MovementIs(Movement),
    /// Live movement must not equal this gait
    MovementNot(Movement),
    /// Live posture must equal this posture
    PostureIs(Posture),
    /// Live posture must not equal this posture
    PostureNot(Posture),
    /// Live mental state must equal this state
    MentalIs(MentalState),
    /// Live mental state must not equal this state
    MentalNot(MentalState),
}

impl EdgeGuard {
    pub fn holds(&self, snapshot: &ActorSnapshot) -> bool {
        match self {
            EdgeGuard::Always => true,
            EdgeGuard::MovementIs(m) => snapshot.movement == *m,
            EdgeGuard::MovementNot(m) => snapshot.movement != *m,
            EdgeGuard::PostureIs(p) => snapshot.posture == *p,
            EdgeGuard::PostureNot(p) => snapshot.posture != *p,
            EdgeGuard::MentalIs(m) => snapshot.mental == *m,
            EdgeGuard::MentalNot(m) => snapshot.mental != *m,
        }
    }
}

/// Guard for a posture edge, keyed by the value being entered
pub fn posture_guard(next: Posture) -> EdgeGuard {
    match next {
        // The body must be still before hitting the ground
        Posture::Prone => EdgeGuard::MovementIs(Movement::Stand),
        // Crouching mid-run is not a legal transition
        Posture::Crouch => EdgeGuard::MovementNot(Movement::Run),
        Posture::Stand => EdgeGuard::Always,
    }
}

/// Guard for a movement edge, keyed by the gait being entered
pub fn movement_guard(next: Movement) -> EdgeGuard {
    match next {
        Movement::Run => EdgeGuard::PostureIs(Posture::Stand),
        Movement::Walk | Movement::Sneak => EdgeGuard::PostureNot(Posture::Prone),
        Movement::Stand => EdgeGuard::Always,
    }
}

/// Guard for a weapon edge, keyed by the state being entered
pub fn weapon_guard(next: WeaponState) -> EdgeGuard {
    match next {
        WeaponState::Firing => EdgeGuard::MentalIs(MentalState::FiringCombat),
        WeaponState::SniperAim => EdgeGuard::MentalNot(MentalState::Free),
        _ => EdgeGuard::Always,
    }
}
