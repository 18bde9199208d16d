//! Cross-axis mutual exclusion
//!
//! Some axes drive the same physical resource and cannot advance at the
//! same time: turning and posture changes both move the skeletal root,
//! weapon handling and animation clips both own the hands. The lock
//! table is a static adjacency relation, declared once.

use serde::{Deserialize, Serialize};

use super::AttributeAxis;

/// A shared physical resource two axes contend for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockGroup {
    /// Turning and posture changes both move the skeletal root
    SkeletalRoot,
    /// Weapon handling and animation clips both own the hands
    WeaponHands,
}

pub const LOCK_GROUP_COUNT: usize = 2;

impl LockGroup {
    pub fn index(&self) -> usize {
        match self {
            LockGroup::SkeletalRoot => 0,
            LockGroup::WeaponHands => 1,
        }
    }
}

/// The lock an axis must hold while advancing, if any
pub fn lock_group(axis: AttributeAxis) -> Option<LockGroup> {
    match axis {
        AttributeAxis::Direction | AttributeAxis::Posture => Some(LockGroup::SkeletalRoot),
        AttributeAxis::Weapon | AttributeAxis::Animation => Some(LockGroup::WeaponHands),
        AttributeAxis::Movement | AttributeAxis::Mental => None,
    }
}

/// Axes that share a lock with `axis` (excluding `axis` itself)
pub fn lock_peers(axis: AttributeAxis) -> &'static [AttributeAxis] {
    match axis {
        AttributeAxis::Direction => &[AttributeAxis::Posture],
        AttributeAxis::Posture => &[AttributeAxis::Direction],
        AttributeAxis::Weapon => &[AttributeAxis::Animation],
        AttributeAxis::Animation => &[AttributeAxis::Weapon],
        AttributeAxis::Movement | AttributeAxis::Mental => &[],
    }
}

/// Per-actor lock holders, one slot per group
///
/// Acquire and release are driven by the orchestrator as part of the
/// action start/finish pairing; the set itself only records who holds
/// what.
#[derive(Debug, Clone, Default)]
pub struct LockSet {
    holders: [Option<AttributeAxis>; LOCK_GROUP_COUNT],
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder of a group
    pub fn holder(&self, group: LockGroup) -> Option<AttributeAxis> {
        self.holders[group.index()]
    }

    /// True iff the lock `axis` needs is held by a different axis
    pub fn locked_out(&self, axis: AttributeAxis) -> bool {
        match lock_group(axis) {
            Some(group) => matches!(self.holder(group), Some(holder) if holder != axis),
            None => false,
        }
    }

    /// Take a group for `axis`. Returns false if another axis holds it.
    pub fn acquire(&mut self, group: LockGroup, axis: AttributeAxis) -> bool {
        match self.holders[group.index()] {
            None => {
                self.holders[group.index()] = Some(axis);
                true
            }
            Some(holder) => holder == axis,
        }
    }

    /// Release a group held by `axis`. Releasing a group held by a
    /// different axis is a pairing bug; it is left untouched.
    pub fn release(&mut self, group: LockGroup, axis: AttributeAxis) {
        if self.holders[group.index()] == Some(axis) {
            self.holders[group.index()] = None;
        }
    }

    pub fn clear(&mut self) {
        self.holders = [None; LOCK_GROUP_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_table_is_symmetric() {
        for axis in crate::axis::AXIS_ORDER {
            for &peer in lock_peers(axis) {
                assert!(lock_peers(peer).contains(&axis), "{} <-> {}", axis, peer);
                assert_eq!(lock_group(axis), lock_group(peer));
            }
        }
    }

    #[test]
    fn test_unlocked_axes_have_no_group() {
        assert_eq!(lock_group(AttributeAxis::Movement), None);
        assert_eq!(lock_group(AttributeAxis::Mental), None);
    }

    #[test]
    fn test_acquire_blocks_peer() {
        let mut locks = LockSet::new();
        assert!(locks.acquire(LockGroup::SkeletalRoot, AttributeAxis::Direction));

        assert!(locks.locked_out(AttributeAxis::Posture));
        assert!(!locks.locked_out(AttributeAxis::Direction));
        assert!(!locks.locked_out(AttributeAxis::Weapon));

        assert!(!locks.acquire(LockGroup::SkeletalRoot, AttributeAxis::Posture));
    }

    #[test]
    fn test_release_frees_peer() {
        let mut locks = LockSet::new();
        locks.acquire(LockGroup::WeaponHands, AttributeAxis::Animation);
        assert!(locks.locked_out(AttributeAxis::Weapon));

        locks.release(LockGroup::WeaponHands, AttributeAxis::Animation);
        assert!(!locks.locked_out(AttributeAxis::Weapon));
    }

    #[test]
    fn test_release_by_non_holder_is_ignored() {
        let mut locks = LockSet::new();
        locks.acquire(LockGroup::WeaponHands, AttributeAxis::Weapon);
        locks.release(LockGroup::WeaponHands, AttributeAxis::Animation);
        assert_eq!(locks.holder(LockGroup::WeaponHands), Some(AttributeAxis::Weapon));
    }

    #[test]
    fn test_reacquire_by_holder_is_idempotent() {
        let mut locks = LockSet::new();
        assert!(locks.acquire(LockGroup::SkeletalRoot, AttributeAxis::Posture));
        assert!(locks.acquire(LockGroup::SkeletalRoot, AttributeAxis::Posture));
    }
}
