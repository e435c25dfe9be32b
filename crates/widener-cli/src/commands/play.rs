//! Real-time playback through the widener.

use super::common::{WidenerArgs, describe_params};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use widener_engine::SharedParams;
use widener_engine::params::{WIDTH_HIGHER, WIDTH_LOWER};
use widener_io::{OutputStream, read_wav_stereo};

#[derive(Args)]
pub struct PlayArgs {
    /// WAV file to play
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    widener: WidenerArgs,

    /// Output device (index, exact name, or partial name)
    #[arg(short, long)]
    device: Option<String>,

    /// Sweep both widths 0 -> 100 -> 0 with this period in seconds
    #[arg(long, value_name = "SECONDS")]
    sweep: Option<f32>,

    /// Loop playback
    #[arg(short, long, alias = "repeat")]
    r#loop: bool,

    /// Processing block size
    #[arg(long, default_value = "256")]
    block_size: usize,
}

/// Width at `elapsed` seconds of a triangle sweep with `period` seconds.
fn sweep_width(elapsed: f32, period: f32) -> f32 {
    let phase = (elapsed / period).fract();
    let triangle = if phase < 0.5 {
        phase * 2.0
    } else {
        2.0 - phase * 2.0
    };
    triangle * 100.0
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    println!("Loading {}...", args.file.display());
    let (samples, spec) = read_wav_stereo(&args.file)?;
    let total_frames = samples.len();
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} Hz, {:.1}s",
        total_frames,
        spec.sample_rate,
        total_frames as f32 / sample_rate
    );

    let mut widener = args.widener.build()?;
    let params = widener.params();
    widener.prepare(sample_rate, args.block_size)?;
    println!("Widening: {}", describe_params(&params));

    let mut stream = OutputStream::open(args.device.as_deref())?;
    if stream.sample_rate() != spec.sample_rate {
        tracing::warn!(
            file = spec.sample_rate,
            device = stream.sample_rate(),
            "sample rate mismatch, playback will be off-speed"
        );
    }
    println!("Output: {} ({} Hz)", stream.device_name(), stream.sample_rate());

    let stop = stream.stop_handle();
    let ctrlc_stop = stop.clone();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        ctrlc_stop.stop();
    })?;

    let shared = Arc::new(SharedParams::new(params));
    if let Some(period) = args.sweep.filter(|p| *p > 0.0) {
        let control = Arc::clone(&shared);
        let sweep_stop = stop.clone();
        std::thread::spawn(move || {
            let start = Instant::now();
            // Wait for the stream to start before polling the stop flag.
            while !sweep_stop.is_running() && start.elapsed() < Duration::from_secs(2) {
                std::thread::sleep(Duration::from_millis(5));
            }
            while sweep_stop.is_running() {
                let width = sweep_width(start.elapsed().as_secs_f32(), period);
                control.set(WIDTH_LOWER, width);
                control.set(WIDTH_HIGHER, width);
                std::thread::sleep(Duration::from_millis(20));
            }
        });
        println!("Sweeping width with a {period:.1}s period");
    }

    let looping = args.r#loop;
    println!(
        "\nPlaying{}... Press Ctrl+C to stop.\n",
        if looping { " (looping)" } else { "" }
    );

    let source = samples;
    let mut position = 0usize;
    stream.run(args.block_size, move |left, right| {
        let mut filled = 0;
        while filled < left.len() {
            if position >= total_frames {
                if !looping || total_frames == 0 {
                    break;
                }
                position = 0;
            }
            let n = (left.len() - filled).min(total_frames - position);
            left[filled..filled + n].copy_from_slice(&source.left[position..position + n]);
            right[filled..filled + n].copy_from_slice(&source.right[position..position + n]);
            filled += n;
            position += n;
        }
        left[filled..].fill(0.0);
        right[filled..].fill(0.0);

        widener.sync(&shared);
        widener.process_block(left, right);
        filled == left.len()
    })?;

    println!("Done!");
    Ok(())
}
