//! Live per-axis values for one actor
//!
//! The snapshot is owned by the host's actor object. This core only
//! reads it; the motion/animation layer is the sole writer, applying
//! the effect of each issued command when it completes.

use serde::{Deserialize, Serialize};

use crate::axis::{MentalState, Movement, Posture, WeaponState};
use crate::core::types::{Bearing, ClipId, TargetRef};

/// Current values of every behavioral attribute
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActorSnapshot {
    pub posture: Posture,
    pub movement: Movement,
    pub weapon: WeaponState,
    pub mental: MentalState,
    /// Current facing
    pub bearing: Bearing,
    /// Object the motion layer is keeping the actor faced at, if any
    pub tracking: Option<TargetRef>,
    /// Clip the animation layer is holding, if any
    pub animation: Option<ClipId>,
}

impl ActorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_relaxed() {
        let snapshot = ActorSnapshot::new();
        assert_eq!(snapshot.posture, Posture::Stand);
        assert_eq!(snapshot.movement, Movement::Stand);
        assert_eq!(snapshot.weapon, WeaponState::Strapped);
        assert_eq!(snapshot.mental, MentalState::Free);
        assert!(snapshot.tracking.is_none());
        assert!(snapshot.animation.is_none());
    }
}
