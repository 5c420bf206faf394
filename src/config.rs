//! Playback configuration.

use crate::error::VideoError;

/// Output cropping mode.
///
/// The decoded frame is always converted to RGBA at its native dimensions;
/// cropping selects a centered window of that output. `Full` is the default
/// and leaves the frame untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// No cropping, output equals the native frame.
    #[default]
    Full,
    /// Centered square with side `min(width, height)`.
    CenterSquare,
    /// Centered window of the given dimensions, clamped to the native frame.
    Center { width: usize, height: usize },
}

/// Configuration for a [`VideoPlayer`](crate::VideoPlayer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Playback speed multiplier applied to presentation timestamps.
    ///
    /// 1.0 plays in real time, 0.5 at half speed, 2.0 at double speed.
    pub speed: f64,

    /// Output cropping mode.
    pub crop: CropMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            crop: CropMode::Full,
        }
    }
}

impl PlaybackConfig {
    /// Reject configurations the pipeline cannot honor.
    pub(crate) fn validate(&self) -> Result<(), VideoError> {
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(VideoError::InvalidConfig(format!(
                "playback speed must be finite and positive, got {}",
                self.speed
            )));
        }
        Ok(())
    }
}

/// Returns the crate version from Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PlaybackConfig::default().validate().is_ok());
        assert_eq!(PlaybackConfig::default().crop, CropMode::Full);
    }

    #[test]
    fn test_rejects_bad_speed() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = PlaybackConfig {
                speed,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(VideoError::InvalidConfig(_))
            ));
        }
    }
}
