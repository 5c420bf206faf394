//! Public playback handle for the rendering layer.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ac_ffmpeg::codec::video::frame::PixelFormat;
use log::warn;

use crate::config::PlaybackConfig;
use crate::decoder::{DecoderSession, RgbaConverter};
use crate::display::{FrameReceiver, RgbaFrame, frame_exchange};
use crate::error::VideoError;
use crate::pipeline::{PlaybackLoop, PlaybackPhase, PlaybackStatus};
use crate::utils::StopSignal;

/// A looping video source feeding the latest decoded frame to a consumer.
///
/// `open` probes the container and prepares the pipeline; `start` spawns the
/// background decode thread; the consumer then polls [`frame`](Self::frame)
/// once per render tick. Dropping the player cancels and joins the thread.
///
/// Each player owns exactly one media source; multiple players are fully
/// independent.
pub struct VideoPlayer {
    runner: Option<PlaybackLoop>,
    receiver: FrameReceiver,
    dimensions: (usize, usize),
    pixel_format: PixelFormat,
    stop: StopSignal,
    status: Arc<PlaybackStatus>,
    thread: Option<JoinHandle<()>>,
}

impl VideoPlayer {
    /// Open a media source and prepare the decode pipeline.
    pub fn open(path: impl AsRef<Path>, config: PlaybackConfig) -> Result<Self, VideoError> {
        config.validate()?;

        let session = DecoderSession::open(path.as_ref(), config.crop)?;
        let descriptor = *session.descriptor();
        let converter = RgbaConverter::new(
            descriptor.pixel_format,
            descriptor.width,
            descriptor.height,
            session.crop(),
        )?;

        let (publisher, receiver) = frame_exchange();
        let stop = StopSignal::new();
        let status = Arc::new(PlaybackStatus::new());
        let dimensions = session.output_dimensions();

        let runner = PlaybackLoop::new(
            session,
            converter,
            publisher,
            config.speed,
            stop.clone(),
            Arc::clone(&status),
        );

        Ok(Self {
            runner: Some(runner),
            receiver,
            dimensions,
            pixel_format: descriptor.pixel_format,
            stop,
            status,
            thread: None,
        })
    }

    /// Spawn the background playback thread.
    ///
    /// Calling `start` again, whether the player is still running or was
    /// already stopped, is a logged no-op.
    pub fn start(&mut self) -> Result<(), VideoError> {
        let Some(runner) = self.runner.take() else {
            warn!("start() called on an already started or stopped player");
            return Ok(());
        };

        let handle = thread::Builder::new()
            .name("framefeed-playback".into())
            .spawn(move || runner.run())
            .map_err(|err| VideoError::Thread(err.to_string()))?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Output dimensions the consumer should expect (after cropping).
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Native decoded pixel format; frames delivered through
    /// [`frame`](Self::frame) are always RGBA8888 regardless.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The most recent complete frame, or `None` before the first publish.
    ///
    /// The reference is valid until the next `frame` call. Repeats are
    /// detectable through [`RgbaFrame::sequence`].
    pub fn frame(&mut self) -> Option<&RgbaFrame> {
        self.receiver.latest()
    }

    /// True if a frame newer than the last returned one is waiting.
    pub fn fresh_frame_available(&self) -> bool {
        self.receiver.fresh_available()
    }

    /// Total frames the playback thread has published so far.
    pub fn frames_published(&self) -> u64 {
        self.receiver.published()
    }

    /// Current phase of the playback thread.
    pub fn phase(&self) -> PlaybackPhase {
        self.status.phase()
    }

    /// The error that killed the playback thread, if it failed. A consumer
    /// seeing a frozen frame can use this to tell a stall from a still.
    pub fn last_error(&self) -> Option<VideoError> {
        self.status.last_error()
    }

    /// Cancel playback and join the background thread.
    pub fn stop(&mut self) {
        self.stop.cancel();
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            warn!("playback thread panicked");
        }
    }
}

impl Drop for VideoPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
