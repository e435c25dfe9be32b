//! File-based widening command.

use super::common::{WidenerArgs, describe_params, to_db};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use widener_io::{OfflineRenderer, StereoSamples, WavSpec, read_wav_stereo, write_wav_stereo};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    widener: WidenerArgs,

    /// Processing block size
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32", value_parser = ["16", "24", "32"])]
    bit_depth: String,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let bits_per_sample: u16 = args.bit_depth.parse()?;
    let widener = args.widener.build()?;
    let params = widener.params();

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav_stereo(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} frames, {} ch, {} Hz, {:.2}s",
        input.len(),
        spec.channels,
        spec.sample_rate,
        input.len() as f32 / sample_rate
    );
    println!("Widening: {}", describe_params(&params));

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(input.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut renderer = OfflineRenderer::new(widener, args.block_size);
    let output = renderer.render_with_progress(&input, sample_rate, |done, _| {
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    print_stats("Input", &input);
    print_stats("Output", &output);

    let out_spec = WavSpec {
        channels: 2,
        sample_rate: spec.sample_rate,
        bits_per_sample,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav_stereo(&args.output, &output, out_spec)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("Done!");

    Ok(())
}

fn print_stats(label: &str, samples: &StereoSamples) {
    let rms = |channel: &[f32]| {
        if channel.is_empty() {
            return 0.0;
        }
        (channel.iter().map(|s| s * s).sum::<f32>() / channel.len() as f32).sqrt()
    };
    println!(
        "  {label:6} RMS L/R {:.1}/{:.1} dB, peak {:.1} dB, correlation {:+.3}",
        to_db(rms(&samples.left)),
        to_db(rms(&samples.right)),
        to_db(samples.peak()),
        samples.correlation()
    );
}
