//! framefeed: a background video decode loop for render-thread consumers.
//!
//! Opens a video container, decodes it continuously on a dedicated thread,
//! converts every frame to packed RGBA8888, paces frame release against the
//! stream's timestamps and publishes the latest frame through a tear-free
//! exchange buffer. The consumer (typically a render loop uploading to a
//! texture) polls [`VideoPlayer::frame`] once per tick; playback loops back
//! to the start of the stream forever until the player is stopped or
//! dropped.
//!
//! ```no_run
//! use framefeed::{PlaybackConfig, VideoPlayer};
//!
//! let mut player = VideoPlayer::open("movie.mp4", PlaybackConfig::default())?;
//! let (_width, _height) = player.dimensions();
//! player.start()?;
//!
//! loop {
//!     if let Some(_frame) = player.frame() {
//!         // upload _frame.data (width * height * 4 bytes) to the GPU
//!     }
//!     # break;
//! }
//! # Ok::<(), framefeed::VideoError>(())
//! ```

pub mod config;
pub mod decoder;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod player;
pub mod utils;

pub use config::{CropMode, PlaybackConfig};
pub use display::RgbaFrame;
pub use error::VideoError;
pub use pipeline::PlaybackPhase;
pub use player::VideoPlayer;
