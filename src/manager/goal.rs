//! The currently requested target state for an actor
//!
//! A goal is the resolved descriptor plus the per-request overrides. It
//! is replaced wholesale on every request; overrides are never merged
//! with the previous goal's.

use serde::{Deserialize, Serialize};

use crate::axis::{DirectionTarget, MentalState, Movement, Posture, WeaponState};
use crate::core::types::{ClipId, TargetRef};
use crate::registry::{DescriptorFlags, StateDescriptor};

/// Per-request tweaks layered over the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StateOverrides {
    /// Facing goal for this request (descriptors rarely carry one;
    /// "look at that" comes from the requester)
    pub direction: Option<DirectionTarget>,
    /// Replace the descriptor's weapon target
    pub weapon: Option<WeaponState>,
    /// Concrete item handed to the motion layer with weapon commands
    pub weapon_item: Option<TargetRef>,
    /// Ignore any direction target entirely
    pub skip_direction: bool,
}

/// Resolved descriptor + overrides for one actor
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    descriptor: StateDescriptor,
    overrides: StateOverrides,
}

impl Goal {
    pub fn new(descriptor: StateDescriptor, overrides: StateOverrides) -> Self {
        Self {
            descriptor,
            overrides,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Same goal as an incoming request? Name alone is not enough: the
    /// same state looked at a different target is a new goal.
    pub fn matches(&self, name: &str, overrides: &StateOverrides) -> bool {
        self.descriptor.name == name && self.overrides == *overrides
    }

    pub fn flags(&self) -> DescriptorFlags {
        self.descriptor.flags
    }

    pub fn target_posture(&self) -> Option<Posture> {
        self.descriptor.posture
    }

    pub fn target_movement(&self) -> Option<Movement> {
        self.descriptor.movement
    }

    pub fn target_weapon(&self) -> Option<WeaponState> {
        self.overrides.weapon.or(self.descriptor.weapon)
    }

    pub fn target_mental(&self) -> Option<MentalState> {
        self.descriptor.mental
    }

    pub fn target_direction(&self) -> Option<DirectionTarget> {
        if self.overrides.skip_direction {
            return None;
        }
        self.overrides.direction.or(self.descriptor.direction)
    }

    pub fn target_animation(&self) -> Option<&ClipId> {
        self.descriptor.animation.as_ref()
    }

    pub fn weapon_item(&self) -> Option<TargetRef> {
        self.overrides.weapon_item
    }
}
