//! Load state descriptors from TOML files
//!
//! Format: one `[states.<name>]` table per descriptor, axis names as
//! keys, plus an optional inline `flags` table:
//!
//! ```toml
//! [states.crouch_danger]
//! posture = "crouch"
//! mental = "danger"
//!
//! [states.prone_sniper]
//! posture = "prone"
//! movement = "stand"
//! weapon = "sniper_aim"
//! mental = "firing_combat"
//! flags = { skip_direction_lock = true }
//! ```

use std::fs;
use std::path::Path;

use crate::axis::{MentalState, Movement, Posture, WeaponState};
use crate::core::error::{ComposureError, Result};
use crate::core::types::ClipId;
use crate::registry::{DescriptorFlags, StateDescriptor, StateRegistry};

/// Load and validate a registry from a descriptor file
pub fn load_registry(path: &Path) -> Result<StateRegistry> {
    let content = fs::read_to_string(path)?;
    let descriptors = parse_descriptors(&content)?;
    StateRegistry::from_descriptors(descriptors)
}

/// Parse descriptor TOML without building the registry
pub fn parse_descriptors(content: &str) -> Result<Vec<StateDescriptor>> {
    let toml: toml::Value = content
        .parse()
        .map_err(|e| ComposureError::DescriptorFile(format!("Invalid TOML: {}", e)))?;

    let states = toml
        .get("states")
        .and_then(|v| v.as_table())
        .ok_or_else(|| ComposureError::DescriptorFile("missing [states] tables".to_string()))?;

    let mut descriptors = Vec::with_capacity(states.len());
    for (name, table) in states {
        descriptors.push(parse_descriptor(name, table)?);
    }

    Ok(descriptors)
}

fn parse_descriptor(name: &str, value: &toml::Value) -> Result<StateDescriptor> {
    let table = value.as_table().ok_or_else(|| {
        ComposureError::DescriptorFile(format!("{}: expected a table", name))
    })?;

    let mut descriptor = StateDescriptor::named(name);

    for (key, field) in table {
        match key.as_str() {
            "posture" => descriptor.posture = Some(parse_posture(name, expect_str(name, key, field)?)?),
            "movement" => descriptor.movement = Some(parse_movement(name, expect_str(name, key, field)?)?),
            "weapon" => descriptor.weapon = Some(parse_weapon(name, expect_str(name, key, field)?)?),
            "mental" => descriptor.mental = Some(parse_mental(name, expect_str(name, key, field)?)?),
            "animation" => {
                descriptor.animation = Some(ClipId::new(expect_str(name, key, field)?));
            }
            "flags" => descriptor.flags = parse_flags(name, field)?,
            other => {
                return Err(ComposureError::DescriptorFile(format!(
                    "{}: unknown key '{}'",
                    name, other
                )));
            }
        }
    }

    Ok(descriptor)
}

fn expect_str<'a>(state: &str, key: &str, value: &'a toml::Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        ComposureError::DescriptorFile(format!("{}: '{}' must be a string", state, key))
    })
}

fn parse_flags(state: &str, value: &toml::Value) -> Result<DescriptorFlags> {
    let table = value.as_table().ok_or_else(|| {
        ComposureError::DescriptorFile(format!("{}: 'flags' must be a table", state))
    })?;

    let mut flags = DescriptorFlags::default();
    for (key, field) in table {
        let set = field.as_bool().ok_or_else(|| {
            ComposureError::DescriptorFile(format!("{}: flag '{}' must be a bool", state, key))
        })?;
        match key.as_str() {
            "force_weapon" => flags.force_weapon = set,
            "skip_direction_lock" => flags.skip_direction_lock = set,
            other => {
                return Err(ComposureError::DescriptorFile(format!(
                    "{}: unknown flag '{}'",
                    state, other
                )));
            }
        }
    }

    Ok(flags)
}

fn parse_posture(state: &str, s: &str) -> Result<Posture> {
    match s {
        "stand" => Ok(Posture::Stand),
        "crouch" => Ok(Posture::Crouch),
        "prone" => Ok(Posture::Prone),
        other => Err(ComposureError::DescriptorFile(format!(
            "{}: unknown posture '{}'",
            state, other
        ))),
    }
}

fn parse_movement(state: &str, s: &str) -> Result<Movement> {
    match s {
        "stand" => Ok(Movement::Stand),
        "walk" => Ok(Movement::Walk),
        "run" => Ok(Movement::Run),
        "sneak" => Ok(Movement::Sneak),
        other => Err(ComposureError::DescriptorFile(format!(
            "{}: unknown movement '{}'",
            state, other
        ))),
    }
}

fn parse_weapon(state: &str, s: &str) -> Result<WeaponState> {
    match s {
        "strapped" => Ok(WeaponState::Strapped),
        "unstrapped" => Ok(WeaponState::Unstrapped),
        "firing" => Ok(WeaponState::Firing),
        "sniper_aim" => Ok(WeaponState::SniperAim),
        other => Err(ComposureError::DescriptorFile(format!(
            "{}: unknown weapon state '{}'",
            state, other
        ))),
    }
}

fn parse_mental(state: &str, s: &str) -> Result<MentalState> {
    match s {
        "free" => Ok(MentalState::Free),
        "danger" => Ok(MentalState::Danger),
        "firing_combat" => Ok(MentalState::FiringCombat),
        other => Err(ComposureError::DescriptorFile(format!(
            "{}: unknown mental state '{}'",
            state, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let toml_str = r#"
[states.ambush_crouch]
posture = "crouch"
movement = "stand"
weapon = "unstrapped"
mental = "danger"
animation = "idle_tense"
flags = { skip_direction_lock = true }
"#;
        let descriptors = parse_descriptors(toml_str).unwrap();
        assert_eq!(descriptors.len(), 1);

        let d = &descriptors[0];
        assert_eq!(d.name, "ambush_crouch");
        assert_eq!(d.posture, Some(Posture::Crouch));
        assert_eq!(d.movement, Some(Movement::Stand));
        assert_eq!(d.weapon, Some(WeaponState::Unstrapped));
        assert_eq!(d.mental, Some(MentalState::Danger));
        assert_eq!(d.animation, Some(ClipId::new("idle_tense")));
        assert!(d.flags.skip_direction_lock);
        assert!(!d.flags.force_weapon);
    }

    #[test]
    fn test_parse_partial_descriptor() {
        let toml_str = r#"
[states.crouch_only]
posture = "crouch"
"#;
        let descriptors = parse_descriptors(toml_str).unwrap();
        assert_eq!(descriptors[0].posture, Some(Posture::Crouch));
        assert_eq!(descriptors[0].movement, None);
    }

    #[test]
    fn test_unknown_axis_value_rejected() {
        let toml_str = r#"
[states.bad]
posture = "kneel"
"#;
        assert!(matches!(
            parse_descriptors(toml_str),
            Err(ComposureError::DescriptorFile(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let toml_str = r#"
[states.bad]
stance = "crouch"
"#;
        assert!(parse_descriptors(toml_str).is_err());
    }

    #[test]
    fn test_transit_weapon_value_not_parseable() {
        // Transit values are not descriptor vocabulary at all
        let toml_str = r#"
[states.bad]
weapon = "unstrapping"
"#;
        assert!(parse_descriptors(toml_str).is_err());
    }

    #[test]
    fn test_loaded_descriptors_still_validated() {
        // The loader parses fine; registry construction applies the
        // legality rules.
        let toml_str = r#"
[states.bad]
posture = "prone"
movement = "run"
"#;
        let descriptors = parse_descriptors(toml_str).unwrap();
        assert!(matches!(
            StateRegistry::from_descriptors(descriptors),
            Err(ComposureError::InvalidDescriptor { .. })
        ));
    }
}
