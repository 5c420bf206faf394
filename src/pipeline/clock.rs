//! Playback clock and frame-release pacing.
//!
//! The clock captures a monotonic reference instant at the start of each
//! playback pass. Pacing compares a packet's decode timestamp, scaled by the
//! playback speed, against the wall-clock time elapsed since that reference
//! and yields the remaining wait before the frame may be released.

use std::time::{Duration, Instant};

use ac_ffmpeg::time::Timestamp;

/// Monotonic reference clock for one playback pass.
///
/// Restarted whenever the stream loops back to the beginning, so timestamps
/// of the new pass are measured against a fresh origin.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    base: Instant,
}

impl PlaybackClock {
    /// Start a new clock with the current instant as origin.
    pub fn start() -> Self {
        Self {
            base: Instant::now(),
        }
    }

    /// Reset the origin to now. Called on every stream restart.
    pub fn restart(&mut self) {
        self.base = Instant::now();
    }

    /// Wall-clock microseconds elapsed since the origin.
    pub fn elapsed_micros(&self) -> i64 {
        self.base.elapsed().as_micros() as i64
    }
}

/// Pacing law: how long to wait before releasing a frame.
///
/// `dts_micros` is the packet's decode timestamp converted to microseconds,
/// or `None` when the stream reports no timestamp; a missing timestamp is
/// treated as zero, releasing the frame as soon as possible. A frame whose
/// target time has already passed yields a zero delay; there is no catch-up
/// or frame-drop on lateness.
pub fn release_delay(dts_micros: Option<i64>, speed: f64, elapsed_micros: i64) -> Duration {
    let target_us = (dts_micros.unwrap_or(0) as f64 / speed) as i64;
    let delay_us = target_us - elapsed_micros;
    if delay_us > 0 {
        Duration::from_micros(delay_us as u64)
    } else {
        Duration::ZERO
    }
}

/// [`release_delay`] for an `ac-ffmpeg` timestamp, which already carries the
/// stream time-base.
pub fn delay_until_release(dts: Timestamp, speed: f64, clock: &PlaybackClock) -> Duration {
    release_delay(dts.as_micros(), speed, clock.elapsed_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timestamp_releases_immediately() {
        assert_eq!(release_delay(Some(0), 1.0, 0), Duration::ZERO);

        // Right after a clock reset the elapsed time is within scheduling
        // epsilon, so the delay must still be (effectively) zero.
        let clock = PlaybackClock::start();
        let delay = release_delay(Some(0), 1.0, clock.elapsed_micros());
        assert!(delay <= Duration::from_millis(1));
    }

    #[test]
    fn test_one_second_target_at_elapsed_zero() {
        let delay = release_delay(Some(1_000_000), 1.0, 0);
        assert_eq!(delay, Duration::from_micros(1_000_000));
    }

    #[test]
    fn test_speed_scaling_law() {
        let pts_us = 800_000;
        let normal = release_delay(Some(pts_us), 1.0, 0);
        let double = release_delay(Some(pts_us), 2.0, 0);
        let half = release_delay(Some(pts_us), 0.5, 0);

        assert_eq!(double, normal / 2);
        assert_eq!(half, normal * 2);
    }

    #[test]
    fn test_late_frame_yields_zero_delay() {
        assert_eq!(release_delay(Some(100_000), 1.0, 250_000), Duration::ZERO);
    }

    #[test]
    fn test_missing_timestamp_treated_as_zero() {
        assert_eq!(release_delay(None, 1.0, 0), Duration::ZERO);
        assert_eq!(release_delay(None, 1.0, 500_000), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_reduces_delay() {
        let delay = release_delay(Some(1_000_000), 1.0, 400_000);
        assert_eq!(delay, Duration::from_micros(600_000));
    }

    #[test]
    fn test_clock_restart_resets_origin() {
        let mut clock = PlaybackClock::start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.elapsed_micros() >= 5_000);

        clock.restart();
        assert!(clock.elapsed_micros() < 5_000);
    }
}
