//! End-to-end playback over a real encoded clip: the stream must wrap back
//! to the beginning and keep publishing frames pass after pass.

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ac_ffmpeg::codec::Encoder;
use ac_ffmpeg::codec::video::frame::get_pixel_format;
use ac_ffmpeg::codec::video::{VideoEncoder, VideoFrameMut};
use ac_ffmpeg::format::io::IO;
use ac_ffmpeg::format::muxer::{Muxer, OutputFormat};
use ac_ffmpeg::time::{TimeBase, Timestamp};

use framefeed::{PlaybackConfig, PlaybackPhase, VideoPlayer};

const CLIP_FRAMES: i64 = 10;
const WIDTH: usize = 320;
const HEIGHT: usize = 240;

/// Encode `CLIP_FRAMES` black frames at 25 fps into a fresh mp4 file.
fn encode_test_clip(path: &PathBuf) {
    let pixel_format = get_pixel_format("yuv420p");
    let time_base = TimeBase::new(1, 25);

    let mut encoder = VideoEncoder::builder("mpeg4")
        .unwrap()
        .pixel_format(pixel_format)
        .width(WIDTH)
        .height(HEIGHT)
        .time_base(time_base)
        .build()
        .unwrap();

    let codec_parameters = encoder.codec_parameters().into();

    let output_format = OutputFormat::guess_from_file_name(path.to_str().unwrap()).unwrap();
    let io = IO::from_seekable_write_stream(File::create(path).unwrap());

    let mut muxer_builder = Muxer::builder();
    muxer_builder.add_stream(&codec_parameters).unwrap();
    let mut muxer = muxer_builder.build(io, output_format).unwrap();

    for i in 0..CLIP_FRAMES {
        let frame = VideoFrameMut::black(pixel_format, WIDTH, HEIGHT)
            .with_time_base(time_base)
            .with_pts(Timestamp::new(i, time_base))
            .freeze();

        encoder.push(frame).unwrap();
        while let Some(packet) = encoder.take().unwrap() {
            muxer.push(packet.with_stream_index(0)).unwrap();
        }
    }

    encoder.flush().unwrap();
    while let Some(packet) = encoder.take().unwrap() {
        muxer.push(packet.with_stream_index(0)).unwrap();
    }

    muxer.flush().unwrap();
}

#[test]
fn test_stream_loops_past_end_of_clip() {
    let path = std::env::temp_dir().join(format!("framefeed-loop-{}.mp4", std::process::id()));
    encode_test_clip(&path);

    // High speed so several 10-frame passes fit well inside the deadline.
    let config = PlaybackConfig {
        speed: 50.0,
        ..Default::default()
    };

    let mut player = VideoPlayer::open(&path, config).unwrap();
    assert_eq!(player.dimensions(), (WIDTH, HEIGHT));
    player.start().unwrap();

    // More publishes than the clip holds proves the rewind and the decoder
    // reset both worked; two extra passes rule out a lucky off-by-one.
    let target = (CLIP_FRAMES as u64) * 3;
    let deadline = Instant::now() + Duration::from_secs(30);
    while player.frames_published() < target && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }

    assert!(
        player.frames_published() >= target,
        "only {} frames published before the deadline (wanted {}), last error: {:?}",
        player.frames_published(),
        target,
        player.last_error()
    );
    assert!(player.phase().is_live());
    assert!(player.last_error().is_none());

    let frame = player.frame().unwrap();
    assert_eq!((frame.width, frame.height), (WIDTH, HEIGHT));
    assert_eq!(frame.data.len(), WIDTH * HEIGHT * 4);

    player.stop();
    assert_eq!(player.phase(), PlaybackPhase::Stopped);

    // Restarting a stopped player stays a no-op.
    assert!(player.start().is_ok());

    let _ = std::fs::remove_file(&path);
}
