//! Playback phase tracking.

/// Phase of the background playback loop.
///
/// Normal operation cycles `Decoding → Flushing → Restarting → Decoding`
/// forever; `Stopped` and `Failed` are terminal and only reached through
/// cancellation or a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Thread not started yet.
    Idle,

    /// Reading packets and draining decoded frames.
    Decoding,

    /// End-of-stream reached, draining frames buffered inside the decoder.
    Flushing,

    /// Seeking back to the start of the container for the next pass.
    Restarting,

    /// Cancelled and joined cleanly.
    Stopped,

    /// The playback thread died on an unrecoverable error.
    Failed,
}

impl PlaybackPhase {
    /// Check whether a transition to `target` is part of the loop's cycle.
    pub fn can_transition_to(&self, target: PlaybackPhase) -> bool {
        use PlaybackPhase::*;

        match (self, target) {
            (Idle, Decoding) => true,
            (Decoding, Flushing) => true,
            (Flushing, Restarting) => true,
            (Restarting, Decoding) => true,

            // Cancellation and fatal errors can interrupt any live phase.
            (Idle | Decoding | Flushing | Restarting, Stopped | Failed) => true,

            // Terminal states are absorbing.
            (Stopped | Failed, _) => false,

            _ => false,
        }
    }

    /// True while the playback thread is (or should be) alive.
    pub fn is_live(&self) -> bool {
        !matches!(self, PlaybackPhase::Stopped | PlaybackPhase::Failed)
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackPhase::Idle => "Idle",
            PlaybackPhase::Decoding => "Decoding",
            PlaybackPhase::Flushing => "Flushing",
            PlaybackPhase::Restarting => "Restarting",
            PlaybackPhase::Stopped => "Stopped",
            PlaybackPhase::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackPhase::*;

    #[test]
    fn test_loop_cycle_is_valid() {
        assert!(Idle.can_transition_to(Decoding));
        assert!(Decoding.can_transition_to(Flushing));
        assert!(Flushing.can_transition_to(Restarting));
        assert!(Restarting.can_transition_to(Decoding));
    }

    #[test]
    fn test_terminals_are_absorbing() {
        for phase in [Idle, Decoding, Flushing, Restarting] {
            assert!(phase.can_transition_to(Stopped));
            assert!(phase.can_transition_to(Failed));
        }
        for terminal in [Stopped, Failed] {
            for target in [Idle, Decoding, Flushing, Restarting, Stopped, Failed] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_shortcuts_are_invalid() {
        assert!(!Idle.can_transition_to(Flushing));
        assert!(!Decoding.can_transition_to(Restarting));
        assert!(!Flushing.can_transition_to(Decoding));
    }

    #[test]
    fn test_liveness() {
        assert!(Decoding.is_live());
        assert!(Idle.is_live());
        assert!(!Stopped.is_live());
        assert!(!Failed.is_live());
    }
}
