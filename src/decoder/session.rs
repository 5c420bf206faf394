//! Demux/decode state for one open media source.

use std::fs::File;
use std::path::Path;

use ac_ffmpeg::codec::video::frame::PixelFormat;
use ac_ffmpeg::codec::video::{VideoDecoder, VideoFrame};
use ac_ffmpeg::codec::{Decoder, VideoCodecParameters};
use ac_ffmpeg::format::demuxer::{Demuxer, DemuxerWithStreamInfo, SeekTarget};
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::packet::Packet;
use ac_ffmpeg::time::{TimeBase, Timestamp};
use log::info;

use crate::config::CropMode;
use crate::decoder::convert::CropGeometry;
use crate::error::VideoError;

/// Geometry and timing of the selected video stream. Derived once at open
/// time, immutable afterwards.
#[derive(Clone, Copy)]
pub struct StreamDescriptor {
    /// Index of the selected stream inside the container.
    pub stream_index: usize,
    /// Native decoded width in pixels.
    pub width: usize,
    /// Native decoded height in pixels.
    pub height: usize,
    /// Native decoded pixel format (diagnostic; output is always RGBA).
    pub pixel_format: PixelFormat,
    /// Rational unit used to interpret stream timestamps.
    pub time_base: TimeBase,
}

/// Owns the demuxer and decoder for one open media source.
///
/// All FFmpeg state is owned by this value and released on drop; a pipeline
/// holds at most one session, and independent sessions do not share state.
pub struct DecoderSession {
    demuxer: DemuxerWithStreamInfo<File>,
    decoder: VideoDecoder,
    codec_parameters: VideoCodecParameters,
    descriptor: StreamDescriptor,
    crop: CropGeometry,
}

// Safety: the FFmpeg contexts are owned exclusively by this session and the
// session is only ever used by one thread at a time.
unsafe impl Send for DecoderSession {}

impl DecoderSession {
    /// Open a container, select its first video stream and set up a decoder.
    pub fn open(path: &Path, crop_mode: CropMode) -> Result<Self, VideoError> {
        let file = File::open(path)
            .map_err(|err| VideoError::Open(format!("{}: {}", path.display(), err)))?;

        let io = IO::from_seekable_read_stream(file);

        let demuxer = Demuxer::builder()
            .build(io)
            .map_err(|err| VideoError::Open(err.to_string()))?
            .find_stream_info(None)
            .map_err(|(_, err)| VideoError::Open(err.to_string()))?;

        let (stream_index, codec_parameters) = demuxer
            .streams()
            .iter()
            .map(|stream| stream.codec_parameters())
            .enumerate()
            .find(|(_, params)| params.is_video_codec())
            .ok_or(VideoError::StreamNotFound)?;

        let codec_parameters = codec_parameters
            .into_video_codec_parameters()
            .ok_or(VideoError::StreamNotFound)?;

        let decoder = VideoDecoder::from_codec_parameters(&codec_parameters)
            .map_err(|err| VideoError::DecoderInit(err.to_string()))?
            .build()
            .map_err(|err| VideoError::DecoderInit(err.to_string()))?;

        let descriptor = StreamDescriptor {
            stream_index,
            width: codec_parameters.width(),
            height: codec_parameters.height(),
            pixel_format: codec_parameters.pixel_format(),
            time_base: demuxer.streams()[stream_index].time_base(),
        };

        let crop = CropGeometry::from_mode(crop_mode, descriptor.width, descriptor.height);

        info!(
            "opened {} | format: {} | size: ({}, {}) | crop: ({}, {})",
            path.display(),
            descriptor.pixel_format.name(),
            descriptor.width,
            descriptor.height,
            crop.width,
            crop.height,
        );

        Ok(Self {
            demuxer,
            decoder,
            codec_parameters,
            descriptor,
            crop,
        })
    }

    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    /// Dimensions of the frames the consumer will receive (after cropping).
    pub fn output_dimensions(&self) -> (usize, usize) {
        (self.crop.width, self.crop.height)
    }

    /// Native decoded pixel format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.descriptor.pixel_format
    }

    pub fn crop(&self) -> CropGeometry {
        self.crop
    }

    /// Read the next packet of the selected video stream, skipping packets
    /// of other streams.
    ///
    /// `Ok(None)` is clean end-of-stream; a read error is surfaced as
    /// [`VideoError::PacketRead`] and, unlike end-of-stream, terminates the
    /// session instead of looping.
    pub fn read_packet(&mut self) -> Result<Option<Packet>, VideoError> {
        loop {
            match self.demuxer.take() {
                Ok(Some(packet)) if packet.stream_index() == self.descriptor.stream_index => {
                    return Ok(Some(packet));
                }
                Ok(Some(_)) => continue,
                Ok(None) => return Ok(None),
                Err(err) => return Err(VideoError::PacketRead(err.to_string())),
            }
        }
    }

    /// Feed one packet to the decoder.
    ///
    /// A decoder asking for its buffered frames to be drained first is not
    /// an error; any other failure is fatal to the session.
    pub fn push_packet(&mut self, packet: Packet) -> Result<(), VideoError> {
        match self.decoder.try_push(packet) {
            Ok(()) => Ok(()),
            Err(err) if err.is_again() => Ok(()),
            Err(err) => Err(VideoError::Decode(err.to_string())),
        }
    }

    /// Take the next decoded frame, if the decoder has one ready.
    ///
    /// `Ok(None)` means the decoder needs more input (or, after
    /// [`flush_decoder`](Self::flush_decoder), that it is fully drained).
    pub fn take_frame(&mut self) -> Result<Option<VideoFrame>, VideoError> {
        self.decoder
            .take()
            .map_err(|err| VideoError::Decode(err.to_string()))
    }

    /// Signal end-of-stream so the decoder releases its buffered frames.
    pub fn flush_decoder(&mut self) -> Result<(), VideoError> {
        match self.decoder.try_flush() {
            Ok(()) => Ok(()),
            Err(err) if err.is_again() => Ok(()),
            Err(err) => Err(VideoError::Decode(err.to_string())),
        }
    }

    /// Seek the container back to its beginning.
    pub fn rewind(&mut self) -> Result<(), VideoError> {
        self.demuxer
            .seek_to_timestamp(Timestamp::from_micros(0), SeekTarget::UpTo)
            .map_err(|err| VideoError::PacketRead(err.to_string()))
    }

    /// Reset the decoder state after a flush so the next pass starts clean.
    pub fn reset_decoder(&mut self) -> Result<(), VideoError> {
        self.decoder = VideoDecoder::from_codec_parameters(&self.codec_parameters)
            .map_err(|err| VideoError::DecoderInit(err.to_string()))?
            .build()
            .map_err(|err| VideoError::DecoderInit(err.to_string()))?;
        Ok(())
    }
}
