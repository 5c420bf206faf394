//! The background playback loop.
//!
//! One dedicated thread runs read packet → feed decoder → drain frames →
//! pace → convert → publish. On end-of-stream the decoder is flushed (its
//! buffered frames are still paced and published), the container is rewound
//! and the pass restarts with a fresh clock, looping until cancelled.

use std::sync::{Arc, Mutex};

use ac_ffmpeg::codec::video::VideoFrame;
use ac_ffmpeg::packet::Packet;
use ac_ffmpeg::time::Timestamp;
use log::{debug, error, info};

use crate::decoder::{DecoderSession, RgbaConverter};
use crate::display::FramePublisher;
use crate::error::VideoError;
use crate::pipeline::clock::{PlaybackClock, delay_until_release};
use crate::pipeline::state::PlaybackPhase;
use crate::utils::StopSignal;

/// Observable state of the playback thread: current phase plus the error
/// that killed it, if any. Shared between the thread and the owning player.
#[derive(Debug)]
pub struct PlaybackStatus {
    inner: Mutex<StatusInner>,
}

#[derive(Debug)]
struct StatusInner {
    phase: PlaybackPhase,
    error: Option<VideoError>,
}

impl PlaybackStatus {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                phase: PlaybackPhase::Idle,
                error: None,
            }),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.inner.lock().unwrap().phase
    }

    /// The error that terminated the playback thread, if it failed.
    pub fn last_error(&self) -> Option<VideoError> {
        self.inner.lock().unwrap().error.clone()
    }

    fn set_phase(&self, phase: PlaybackPhase) {
        let mut inner = self.inner.lock().unwrap();
        debug_assert!(
            inner.phase.can_transition_to(phase),
            "invalid phase transition {} -> {}",
            inner.phase,
            phase
        );
        inner.phase = phase;
    }

    fn fail(&self, error: VideoError) {
        let mut inner = self.inner.lock().unwrap();
        inner.phase = PlaybackPhase::Failed;
        inner.error = Some(error);
    }
}

/// Control logic of the playback thread. Owns the decoder session, the
/// converter and the producer half of the frame exchange.
pub struct PlaybackLoop {
    session: DecoderSession,
    converter: RgbaConverter,
    publisher: FramePublisher,
    clock: PlaybackClock,
    speed: f64,
    stop: StopSignal,
    status: Arc<PlaybackStatus>,
    last_dts: Timestamp,
}

impl PlaybackLoop {
    pub(crate) fn new(
        session: DecoderSession,
        converter: RgbaConverter,
        publisher: FramePublisher,
        speed: f64,
        stop: StopSignal,
        status: Arc<PlaybackStatus>,
    ) -> Self {
        Self {
            session,
            converter,
            publisher,
            clock: PlaybackClock::start(),
            speed,
            stop,
            status,
            last_dts: Timestamp::null(),
        }
    }

    /// Thread entry point. Runs until cancelled or a fatal error occurs;
    /// the outcome lands in the shared [`PlaybackStatus`].
    pub fn run(mut self) {
        info!("playback thread started");
        match self.play() {
            Ok(()) => {
                self.status.set_phase(PlaybackPhase::Stopped);
                info!(
                    "playback thread stopped ({} frames published)",
                    self.publisher.published()
                );
            }
            Err(err) => {
                error!("playback thread failed: {}", err);
                self.status.fail(err);
            }
        }
    }

    fn play(&mut self) -> Result<(), VideoError> {
        loop {
            self.clock.restart();
            self.status.set_phase(PlaybackPhase::Decoding);

            loop {
                if self.stop.cancelled() {
                    return Ok(());
                }
                match self.session.read_packet()? {
                    Some(packet) => self.decode_packet(packet)?,
                    None => break,
                }
            }

            // End of stream: drain what the decoder still buffers.
            self.status.set_phase(PlaybackPhase::Flushing);
            self.session.flush_decoder()?;
            while let Some(frame) = self.session.take_frame()? {
                if self.stop.cancelled() {
                    return Ok(());
                }
                self.release(&frame, self.last_dts)?;
            }

            if self.stop.cancelled() {
                return Ok(());
            }

            self.status.set_phase(PlaybackPhase::Restarting);
            self.session.rewind()?;
            self.session.reset_decoder()?;
            debug!(
                "end of stream, restarting from the beginning ({} frames published)",
                self.publisher.published()
            );
        }
    }

    /// Feed one packet and publish every frame the decoder emits for it.
    /// A single packet can yield zero, one or more frames.
    fn decode_packet(&mut self, packet: Packet) -> Result<(), VideoError> {
        let dts = packet.dts();
        self.last_dts = dts;
        self.session.push_packet(packet)?;

        while let Some(frame) = self.session.take_frame()? {
            if self.stop.cancelled() {
                return Ok(());
            }
            self.release(&frame, dts)?;
        }
        Ok(())
    }

    /// Wait until the frame's release time, then convert and publish it.
    fn release(&mut self, frame: &VideoFrame, dts: Timestamp) -> Result<(), VideoError> {
        let delay = delay_until_release(dts, self.speed, &self.clock);
        if !delay.is_zero() && self.stop.wait_timeout(delay) {
            // Cancelled while pacing.
            return Ok(());
        }

        let (width, height) = self.session.output_dimensions();
        let converter = &mut self.converter;

        self.publisher.publish(|slot| {
            slot.width = width;
            slot.height = height;
            converter.convert_into(frame, &mut slot.data)
        })?;

        Ok(())
    }
}
