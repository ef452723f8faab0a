//! Force configuration for the physics step.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coefficients for the four physics passes.
///
/// Deserializes from a partial camelCase object: missing fields keep their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceConfig {
    /// Inverse-square repulsion coefficient (default: 1000.0).
    pub repulsion_strength: f32,
    /// Rest length of an edge spring (default: 50.0).
    pub spring_length: f32,
    /// Hooke's law spring constant (default: 0.08).
    pub spring_stiffness: f32,
    /// Per-step velocity multiplier in [0, 1] (default: 0.85).
    pub damping: f32,
    /// Pull toward the center point (default: 0.002).
    pub gravity_strength: f32,
    /// Speed clamp applied before integration (default: 5.0).
    pub max_velocity: f32,
    /// Gravity target X, usually the viewport center (default: 0.0).
    pub center_x: f32,
    /// Gravity target Y (default: 0.0).
    pub center_y: f32,
    /// Populate the debug force stores each step (default: true).
    pub record_debug_forces: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 1000.0,
            spring_length: 50.0,
            spring_stiffness: 0.08,
            damping: 0.85,
            gravity_strength: 0.002,
            max_velocity: 5.0,
            center_x: 0.0,
            center_y: 0.0,
            record_debug_forces: true,
        }
    }
}

impl ForceConfig {
    /// Copy of this config with every field set in `patch` overwritten.
    pub fn merged(&self, patch: &ForceConfigPatch) -> Self {
        Self {
            repulsion_strength: patch.repulsion_strength.unwrap_or(self.repulsion_strength),
            spring_length: patch.spring_length.unwrap_or(self.spring_length),
            spring_stiffness: patch.spring_stiffness.unwrap_or(self.spring_stiffness),
            damping: patch.damping.unwrap_or(self.damping),
            gravity_strength: patch.gravity_strength.unwrap_or(self.gravity_strength),
            max_velocity: patch.max_velocity.unwrap_or(self.max_velocity),
            center_x: patch.center_x.unwrap_or(self.center_x),
            center_y: patch.center_y.unwrap_or(self.center_y),
            record_debug_forces: patch.record_debug_forces.unwrap_or(self.record_debug_forces),
        }
    }

    /// Reject values that would poison the simulation.
    ///
    /// Every coefficient must be finite and non-negative, and damping must
    /// lie in [0, 1].
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("repulsionStrength", self.repulsion_strength),
            ("springLength", self.spring_length),
            ("springStiffness", self.spring_stiffness),
            ("gravityStrength", self.gravity_strength),
            ("maxVelocity", self.max_velocity),
        ];
        for (field, value) in non_negative {
            check_finite(field, value)?;
            if value < 0.0 {
                return Err(Error::InvalidConfig {
                    field,
                    value,
                    reason: "must not be negative",
                });
            }
        }

        check_finite("damping", self.damping)?;
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(Error::InvalidConfig {
                field: "damping",
                value: self.damping,
                reason: "must be within [0, 1]",
            });
        }

        check_finite("centerX", self.center_x)?;
        check_finite("centerY", self.center_y)?;
        Ok(())
    }
}

/// A partial config update. Fields left out keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceConfigPatch {
    pub repulsion_strength: Option<f32>,
    pub spring_length: Option<f32>,
    pub spring_stiffness: Option<f32>,
    pub damping: Option<f32>,
    pub gravity_strength: Option<f32>,
    pub max_velocity: Option<f32>,
    pub center_x: Option<f32>,
    pub center_y: Option<f32>,
    pub record_debug_forces: Option<bool>,
}

fn check_finite(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            field,
            value,
            reason: "must be finite",
        })
    }
}
