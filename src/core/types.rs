//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulation tick counter (simulation time unit)
pub type Tick = u64;

/// Handle to an external world object (a look-at target, a weapon item)
///
/// The object itself lives in the host simulation; this core only passes
/// the handle through to the motion interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef(pub Uuid);

impl TargetRef {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetRef {
    fn default() -> Self {
        Self::new()
    }
}

/// Facing direction in degrees, normalized to [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Bearing(pub f32);

impl Bearing {
    pub fn new(degrees: f32) -> Self {
        Self(degrees.rem_euclid(360.0))
    }

    /// Smallest absolute angle between two bearings, in [0, 180]
    pub fn distance(&self, other: Bearing) -> f32 {
        let diff = (self.0 - other.0).rem_euclid(360.0);
        if diff > 180.0 { 360.0 - diff } else { diff }
    }
}

/// Symbolic animation clip identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ClipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_unique() {
        assert_ne!(ActorId::new(), ActorId::new());
    }

    #[test]
    fn test_bearing_normalized() {
        assert_eq!(Bearing::new(370.0).0, 10.0);
        assert_eq!(Bearing::new(-90.0).0, 270.0);
    }

    #[test]
    fn test_bearing_distance_wraps() {
        let a = Bearing::new(350.0);
        let b = Bearing::new(10.0);
        assert!((a.distance(b) - 20.0).abs() < 0.001);
        assert!((b.distance(a) - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_bearing_distance_zero() {
        let a = Bearing::new(180.0);
        assert_eq!(a.distance(a), 0.0);
    }

    #[test]
    fn test_clip_id_display() {
        assert_eq!(ClipId::new("guard_scan").to_string(), "guard_scan");
    }
}
