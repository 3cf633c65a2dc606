/// Tunable constants for stroke generation
use crate::error::ConfigError;

/// Configuration shared by unprojection, smoothing and segment construction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StrokeConfig {
    /// Fraction of the way each new point moves from the previous emitted point
    pub smoothing_factor: f32,
    /// Fixed NDC depth used when unprojecting a screen point
    pub depth_hint: f32,
    /// Radius of the cylinder drawn for each segment
    pub line_radius: f32,
    /// Radius of the sphere that rounds each joint
    pub joint_radius: f32,
    /// Segments shorter than this are skipped
    pub min_segment_length: f32,
}

impl StrokeConfig {
    pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.3;
    pub const DEFAULT_DEPTH_HINT: f32 = 0.98;
    pub const DEFAULT_RADIUS: f32 = 0.001;
    pub const DEFAULT_MIN_SEGMENT_LENGTH: f32 = 1e-7;

    pub fn new() -> Self {
        Self {
            smoothing_factor: Self::DEFAULT_SMOOTHING_FACTOR,
            depth_hint: Self::DEFAULT_DEPTH_HINT,
            line_radius: Self::DEFAULT_RADIUS,
            joint_radius: Self::DEFAULT_RADIUS,
            min_segment_length: Self::DEFAULT_MIN_SEGMENT_LENGTH,
        }
    }

    pub fn with_smoothing_factor(mut self, factor: f32) -> Self {
        self.smoothing_factor = factor;
        self
    }

    pub fn with_depth_hint(mut self, depth: f32) -> Self {
        self.depth_hint = depth;
        self
    }

    pub fn with_line_radius(mut self, radius: f32) -> Self {
        self.line_radius = radius;
        self
    }

    pub fn with_joint_radius(mut self, radius: f32) -> Self {
        self.joint_radius = radius;
        self
    }

    pub fn with_min_segment_length(mut self, length: f32) -> Self {
        self.min_segment_length = length;
        self
    }

    /// Check every field is within its usable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails every comparison, so each check is written to reject it
        if !(self.smoothing_factor > 0.0 && self.smoothing_factor <= 1.0) {
            return Err(ConfigError::SmoothingFactor(self.smoothing_factor));
        }
        if !(-1.0..=1.0).contains(&self.depth_hint) {
            return Err(ConfigError::DepthHint(self.depth_hint));
        }
        if !(self.line_radius > 0.0) {
            return Err(ConfigError::Radius {
                name: "line",
                value: self.line_radius,
            });
        }
        if !(self.joint_radius > 0.0) {
            return Err(ConfigError::Radius {
                name: "joint",
                value: self.joint_radius,
            });
        }
        if !(self.min_segment_length >= 0.0) {
            return Err(ConfigError::MinSegmentLength(self.min_segment_length));
        }
        Ok(())
    }
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StrokeConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.smoothing_factor - 0.3).abs() < 1e-6);
        assert!((config.depth_hint - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = StrokeConfig::new().with_smoothing_factor(0.0);
        assert_eq!(config.validate(), Err(ConfigError::SmoothingFactor(0.0)));

        let config = StrokeConfig::new().with_smoothing_factor(f32::NAN);
        assert!(config.validate().is_err());

        let config = StrokeConfig::new().with_depth_hint(1.5);
        assert_eq!(config.validate(), Err(ConfigError::DepthHint(1.5)));

        let config = StrokeConfig::new().with_joint_radius(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Radius { name: "joint", .. })
        ));

        let config = StrokeConfig::new().with_min_segment_length(-0.1);
        assert!(config.validate().is_err());
    }
}
