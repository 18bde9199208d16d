//! Engine configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the state composition engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === DIAGNOSTICS ===
    /// Ticks an axis may stay Blocked before a warning is surfaced
    ///
    /// Blocked axes are normal (locks are expected to clear within a few
    /// ticks once the holding axis finishes). An axis still blocked past
    /// this threshold usually means the goal combination can never be
    /// satisfied, so it is worth telling the requester about.
    pub blocked_warn_ticks: u32,

    // === DIRECTION AXIS ===
    /// Angular tolerance (degrees) within which a bearing goal counts
    /// as reached
    ///
    /// Turning is driven by the external motion system, which settles
    /// near the target bearing rather than exactly on it. 2 degrees is
    /// below anything visible on screen.
    pub direction_tolerance_deg: f32,

    // === PARALLELIZATION ===
    /// Minimum actor count before the world harness ticks actors in
    /// parallel
    ///
    /// Below this threshold, thread overhead exceeds benefits. Actors
    /// never share cursors or locks, so the per-actor passes are
    /// independent.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blocked_warn_ticks: 30,
            direction_tolerance_deg: 2.0,
            parallel_threshold: 256,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.blocked_warn_ticks == 0 {
            return Err("blocked_warn_ticks must be at least 1".into());
        }

        if self.direction_tolerance_deg <= 0.0 || self.direction_tolerance_deg >= 180.0 {
            return Err(format!(
                "direction_tolerance_deg ({}) must be in (0, 180)",
                self.direction_tolerance_deg
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_warn_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.blocked_warn_ticks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tolerance_bounds() {
        let mut config = EngineConfig::default();
        config.direction_tolerance_deg = 0.0;
        assert!(config.validate().is_err());

        config.direction_tolerance_deg = 180.0;
        assert!(config.validate().is_err());

        config.direction_tolerance_deg = 5.0;
        assert!(config.validate().is_ok());
    }
}
