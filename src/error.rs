//! Error taxonomy for the decode pipeline.
//!
//! Open-time errors are returned synchronously from [`VideoPlayer::open`].
//! Errors raised on the playback thread are recorded in the player's status
//! slot so the consumer can tell a stalled pipeline from a still frame.
//!
//! [`VideoPlayer::open`]: crate::VideoPlayer::open

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VideoError {
    /// The container could not be opened or probed.
    #[error("unable to open media source: {0}")]
    Open(String),

    /// The container carries no video stream.
    #[error("no video stream found in media source")]
    StreamNotFound,

    /// The decoder for the stream's codec could not be created.
    #[error("unable to initialize video decoder: {0}")]
    DecoderInit(String),

    /// The decoder failed mid-stream. Fatal to the playback session.
    #[error("video decoding failed: {0}")]
    Decode(String),

    /// Reading a packet from the container failed. Unlike clean end-of-stream,
    /// this terminates the session instead of looping.
    #[error("packet read failed: {0}")]
    PacketRead(String),

    /// Pixel-format conversion or frame geometry handling failed.
    #[error("frame conversion failed: {0}")]
    Convert(String),

    /// The playback configuration is unusable.
    #[error("invalid playback configuration: {0}")]
    InvalidConfig(String),

    /// The playback thread could not be spawned.
    #[error("unable to spawn playback thread: {0}")]
    Thread(String),
}
