//! Named state descriptors and their registry
//!
//! Higher-level behavior never touches individual axes; it requests a
//! named state, and the descriptor says what every axis should converge
//! to. Descriptors are validated and frozen at startup.

pub mod loader;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::axis::{DirectionTarget, MentalState, Movement, Posture, WeaponState};
use crate::core::error::{ComposureError, Result};
use crate::core::types::ClipId;

/// Optional behavior tweaks carried by a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DescriptorFlags {
    /// Weapon edges ignore (and do not take) the weapon-hands lock, so
    /// the weapon changes even while an animation clip is playing
    pub force_weapon: bool,
    /// The direction axis turns without the skeletal-root lock, so
    /// posture changes may overlap the turn
    pub skip_direction_lock: bool,
}

/// Target bundle for one named state
///
/// An unspecified axis is don't-care: it is left wherever it currently
/// is and counts as reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDescriptor {
    pub name: String,
    pub posture: Option<Posture>,
    pub movement: Option<Movement>,
    pub weapon: Option<WeaponState>,
    pub mental: Option<MentalState>,
    pub direction: Option<DirectionTarget>,
    pub animation: Option<ClipId>,
    pub flags: DescriptorFlags,
}

impl StateDescriptor {
    /// An empty (all don't-care) descriptor with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            posture: None,
            movement: None,
            weapon: None,
            mental: None,
            direction: None,
            animation: None,
            flags: DescriptorFlags::default(),
        }
    }

    pub fn with_posture(mut self, posture: Posture) -> Self {
        self.posture = Some(posture);
        self
    }

    pub fn with_movement(mut self, movement: Movement) -> Self {
        self.movement = Some(movement);
        self
    }

    pub fn with_weapon(mut self, weapon: WeaponState) -> Self {
        self.weapon = Some(weapon);
        self
    }

    pub fn with_mental(mut self, mental: MentalState) -> Self {
        self.mental = Some(mental);
        self
    }

    pub fn with_animation(mut self, clip: ClipId) -> Self {
        self.animation = Some(clip);
        self
    }

    pub fn with_flags(mut self, flags: DescriptorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Check per-axis legality rules. Returns every problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.is_empty() {
            problems.push("name must not be empty".to_string());
        }

        if self.movement == Some(Movement::Run) && matches!(self.posture, Some(p) if p != Posture::Stand)
        {
            problems.push("movement=run requires posture=stand".to_string());
        }

        if matches!(self.movement, Some(m) if m.is_moving()) && self.posture == Some(Posture::Prone)
        {
            problems.push("a moving gait is illegal with posture=prone".to_string());
        }

        if matches!(self.weapon, Some(w) if w.is_transit()) {
            problems.push("weapon target must be a stable value".to_string());
        }

        if self.weapon == Some(WeaponState::Firing) && self.mental != Some(MentalState::FiringCombat)
        {
            problems.push("weapon=firing requires mental=firing_combat".to_string());
        }

        if self.weapon == Some(WeaponState::SniperAim)
            && !matches!(
                self.mental,
                Some(MentalState::Danger) | Some(MentalState::FiringCombat)
            )
        {
            problems.push("weapon=sniper_aim requires mental=danger or firing_combat".to_string());
        }

        if matches!(&self.animation, Some(clip) if clip.0.is_empty()) {
            problems.push("animation clip id must not be empty".to_string());
        }

        problems
    }
}

/// Immutable name -> descriptor table, frozen at startup
#[derive(Debug, Default)]
pub struct StateRegistry {
    states: AHashMap<String, StateDescriptor>,
}

impl StateRegistry {
    /// Build a registry from descriptors, validating each one
    ///
    /// A descriptor violating the legality rules fails the whole load;
    /// silently accepting it would surface later as an axis that never
    /// converges.
    pub fn from_descriptors(descriptors: Vec<StateDescriptor>) -> Result<Self> {
        let mut states = AHashMap::new();

        for descriptor in descriptors {
            let mut problems = descriptor.validate();
            if states.contains_key(&descriptor.name) {
                problems.push("duplicate state name".to_string());
            }
            if !problems.is_empty() {
                return Err(ComposureError::InvalidDescriptor {
                    name: descriptor.name,
                    problems,
                });
            }
            states.insert(descriptor.name.clone(), descriptor);
        }

        Ok(Self { states })
    }

    /// The built-in descriptor set
    pub fn with_defaults() -> Self {
        Self::from_descriptors(builtin_descriptors())
            .expect("built-in descriptors must pass validation")
    }

    /// Look up a descriptor by name
    pub fn resolve(&self, name: &str) -> Result<&StateDescriptor> {
        self.states
            .get(name)
            .ok_or_else(|| ComposureError::UnknownState(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

/// The stock state set most hosts start from
pub fn builtin_descriptors() -> Vec<StateDescriptor> {
    use MentalState::*;
    use Movement as Mv;
    use Posture::*;
    use WeaponState as Wp;

    vec![
        StateDescriptor::named("idle_relaxed")
            .with_posture(Stand)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::Strapped)
            .with_mental(Free),
        StateDescriptor::named("patrol_walk")
            .with_posture(Stand)
            .with_movement(Mv::Walk)
            .with_weapon(Wp::Strapped)
            .with_mental(Free),
        StateDescriptor::named("patrol_run")
            .with_posture(Stand)
            .with_movement(Mv::Run)
            .with_weapon(Wp::Strapped)
            .with_mental(Free),
        StateDescriptor::named("guard_watch")
            .with_posture(Stand)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::Unstrapped)
            .with_mental(Danger)
            .with_animation(ClipId::new("guard_scan")),
        StateDescriptor::named("sneak_danger")
            .with_posture(Stand)
            .with_movement(Mv::Sneak)
            .with_weapon(Wp::Unstrapped)
            .with_mental(Danger),
        StateDescriptor::named("crouch_danger")
            .with_posture(Crouch)
            .with_mental(Danger),
        StateDescriptor::named("hide_prone")
            .with_posture(Prone)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::Unstrapped)
            .with_mental(Danger),
        StateDescriptor::named("fire_standing")
            .with_posture(Stand)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::Firing)
            .with_mental(FiringCombat),
        StateDescriptor::named("fire_crouched")
            .with_posture(Crouch)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::Firing)
            .with_mental(FiringCombat),
        StateDescriptor::named("prone_sniper")
            .with_posture(Prone)
            .with_movement(Mv::Stand)
            .with_weapon(Wp::SniperAim)
            .with_mental(FiringCombat)
            .with_flags(DescriptorFlags {
                force_weapon: false,
                skip_direction_lock: true,
            }),
    ]
}
