//! Timing and control logic of the decode-and-present pipeline.
//!
//! The pipeline has exactly two actors: the playback loop on its own thread
//! (producer) and the caller's render loop polling the frame exchange
//! (consumer). The loop blocks only inside the pacing sleep; everything else
//! runs to completion within one iteration.

pub mod clock;
pub mod playback;
pub mod state;

pub use clock::{PlaybackClock, delay_until_release, release_delay};
pub use playback::{PlaybackLoop, PlaybackStatus};
pub use state::PlaybackPhase;
