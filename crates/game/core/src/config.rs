use crate::error::ConfigurationError;

/// Tunable parameters for one agent template.
///
/// All durations are in seconds and all distances in world units. Templates
/// loaded from data files may omit any field; omitted fields take the
/// defaults below.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Name shown on name tags. Elite agents get a prefix.
    pub display_name: String,
    pub max_health: f32,

    // ===== locomotion =====
    pub move_speed: f32,
    /// Distance to the final waypoint at which a path counts as arrived.
    pub arrival_tolerance: f32,

    // ===== sensing =====
    pub detection_radius: f32,
    pub field_of_view_degrees: f32,
    pub detection_check_interval: f32,

    // ===== roaming =====
    pub min_roam_distance: f32,
    pub max_roam_distance: f32,
    /// Candidate points tried before holding position.
    pub max_roam_attempts: u32,
    /// Delay before retrying after every candidate was rejected.
    pub roam_retry_delay: f32,
    /// Upper bound on travelling to one roam destination.
    pub roam_travel_timeout: f32,
    pub min_roaming_pause: f32,
    pub max_roaming_pause: f32,
    pub min_roaming_interval: f32,
    pub max_roaming_interval: f32,

    // ===== chasing =====
    pub chase_repath_interval: f32,

    // ===== combat =====
    pub contact_radius: f32,
    pub contact_damage: f32,
    pub contact_damage_cooldown: f32,
    /// Impulse dealt to players on contact.
    pub knockback_power: f32,
    /// Impulse received when hit by a weapon. Zero disables hit knockback.
    pub hit_knockback_power: f32,
    pub knockback_time: f32,
    pub elite_damage_multiplier: f32,
    pub elite_scale_multiplier: f32,

    // ===== replication =====
    pub transform_sync_interval: f32,
    /// Fraction of the remaining gap a mirror closes per second.
    pub mirror_interpolation_rate: f32,
}

impl AgentConfig {
    pub const DEFAULT_MAX_ROAM_ATTEMPTS: u32 = 15;
    pub const DEFAULT_CHASE_REPATH_INTERVAL: f32 = 0.1;

    /// Checks the ranges and signs the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidRange`] for an inverted `[min, max]`
    /// pair and [`ConfigurationError::InvalidValue`] for a parameter that must
    /// be positive (or non-negative) but is not.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_range(
            "roam_distance",
            self.min_roam_distance,
            self.max_roam_distance,
        )?;
        check_range(
            "roaming_pause",
            self.min_roaming_pause,
            self.max_roaming_pause,
        )?;
        check_range(
            "roaming_interval",
            self.min_roaming_interval,
            self.max_roaming_interval,
        )?;

        check_positive("max_health", self.max_health)?;
        check_positive("move_speed", self.move_speed)?;
        check_positive("detection_radius", self.detection_radius)?;
        check_positive("detection_check_interval", self.detection_check_interval)?;
        check_positive("chase_repath_interval", self.chase_repath_interval)?;
        check_positive("transform_sync_interval", self.transform_sync_interval)?;
        check_positive("elite_damage_multiplier", self.elite_damage_multiplier)?;
        check_positive("elite_scale_multiplier", self.elite_scale_multiplier)?;

        check_non_negative("arrival_tolerance", self.arrival_tolerance)?;
        check_non_negative("contact_radius", self.contact_radius)?;
        check_non_negative("contact_damage", self.contact_damage)?;
        check_non_negative("contact_damage_cooldown", self.contact_damage_cooldown)?;
        check_non_negative("knockback_power", self.knockback_power)?;
        check_non_negative("hit_knockback_power", self.hit_knockback_power)?;
        check_non_negative("knockback_time", self.knockback_time)?;
        check_non_negative("roam_retry_delay", self.roam_retry_delay)?;
        check_non_negative("roam_travel_timeout", self.roam_travel_timeout)?;
        check_non_negative("mirror_interpolation_rate", self.mirror_interpolation_rate)?;

        if !(0.0..=360.0).contains(&self.field_of_view_degrees) {
            return Err(ConfigurationError::InvalidValue {
                field: "field_of_view_degrees",
                value: self.field_of_view_degrees,
            });
        }
        if self.max_roam_attempts == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "max_roam_attempts",
                value: 0.0,
            });
        }

        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            display_name: "Hostile".to_string(),
            max_health: 100.0,
            move_speed: 3.5,
            arrival_tolerance: 0.25,
            detection_radius: 8.0,
            field_of_view_degrees: 120.0,
            detection_check_interval: 0.5,
            min_roam_distance: 2.0,
            max_roam_distance: 6.0,
            max_roam_attempts: Self::DEFAULT_MAX_ROAM_ATTEMPTS,
            roam_retry_delay: 1.0,
            roam_travel_timeout: 8.0,
            min_roaming_pause: 0.5,
            max_roaming_pause: 1.5,
            min_roaming_interval: 0.5,
            max_roaming_interval: 2.0,
            chase_repath_interval: Self::DEFAULT_CHASE_REPATH_INTERVAL,
            contact_radius: 0.75,
            contact_damage: 10.0,
            contact_damage_cooldown: 1.0,
            knockback_power: 6.0,
            hit_knockback_power: 4.0,
            knockback_time: 0.3,
            elite_damage_multiplier: 2.0,
            elite_scale_multiplier: 1.5,
            transform_sync_interval: 0.1,
            mirror_interpolation_rate: 10.0,
        }
    }
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigurationError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
        return Err(ConfigurationError::InvalidRange { field, min, max });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigurationError::InvalidValue { field, value });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigurationError::InvalidValue { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        AgentConfig::default().validate().unwrap();
    }

    #[test]
    fn inverted_roam_range_is_rejected() {
        let config = AgentConfig {
            min_roam_distance: 5.0,
            max_roam_distance: 2.0,
            ..AgentConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidRange {
                field: "roam_distance",
                ..
            })
        ));
    }

    #[test]
    fn zero_scan_interval_is_rejected() {
        let config = AgentConfig {
            detection_check_interval: 0.0,
            ..AgentConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue {
                field: "detection_check_interval",
                ..
            })
        ));
    }
}
