//! Plays a video file in the background for a few seconds and reports how
//! many frames were delivered, polling the frame exchange the way a render
//! loop would.

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use framefeed::{CropMode, PlaybackConfig, VideoPlayer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = Command::new("play")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decode a video file in the background and report frame delivery.")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Path to the video file.")
                .required(true),
        )
        .arg(
            Arg::new("speed")
                .short('s')
                .long("speed")
                .value_name("SPEED")
                .help("Playback speed multiplier (1.0 = real time).")
                .default_value("1.0"),
        )
        .arg(
            Arg::new("square")
                .long("square")
                .help("Crop the output to a centered square.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seconds")
                .long("seconds")
                .value_name("SECONDS")
                .help("How long to keep polling before exiting.")
                .default_value("10"),
        )
        .get_matches();

    let path = matches.get_one::<String>("file").unwrap();
    let speed: f64 = matches
        .get_one::<String>("speed")
        .unwrap()
        .parse()
        .context("invalid --speed value")?;
    let seconds: u64 = matches
        .get_one::<String>("seconds")
        .unwrap()
        .parse()
        .context("invalid --seconds value")?;
    let crop = if matches.get_flag("square") {
        CropMode::CenterSquare
    } else {
        CropMode::Full
    };

    let mut player = VideoPlayer::open(path, PlaybackConfig { speed, crop })?;
    let (width, height) = player.dimensions();
    println!(
        "{}: {}x{} output, native format {}",
        path,
        width,
        height,
        player.pixel_format().name()
    );

    player.start()?;

    let started = Instant::now();
    let mut delivered = 0u64;
    let mut last_sequence = 0u64;

    // Poll at roughly render-tick cadence.
    while started.elapsed() < Duration::from_secs(seconds) {
        if let Some(frame) = player.frame()
            && frame.sequence != last_sequence
        {
            last_sequence = frame.sequence;
            delivered += 1;
        }

        if let Some(err) = player.last_error() {
            player.stop();
            return Err(err).context("playback thread failed");
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    println!(
        "delivered {} frames to the consumer ({} published, phase: {})",
        delivered,
        player.frames_published(),
        player.phase()
    );

    player.stop();
    Ok(())
}
