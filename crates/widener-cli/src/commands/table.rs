//! Decorrelation table commands.

use super::common::to_db;
use clap::{Args, Subcommand};
use std::f32::consts::PI;
use std::path::PathBuf;
use widener_config::{
    DecorrelationTable, OptimizeConfig, OptimizedSequence, coloration, find_table,
};
use widener_core::VelvetNoise;
use widener_engine::{CHANNELS, WidenerSettings};

#[derive(Args)]
pub struct TableArgs {
    #[command(subcommand)]
    command: TableCommand,
}

#[derive(Subcommand)]
enum TableCommand {
    /// Generate velvet sequences for both channels
    Generate {
        /// Output file (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for sequence generation
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Sample rate the table is generated for
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,

        /// Sequence length in milliseconds
        #[arg(long)]
        length_ms: Option<f32>,

        /// Impulses per second
        #[arg(long)]
        density: Option<f32>,

        /// Magnitude decay over the sequence in dB
        #[arg(long)]
        decay_db: Option<f32>,

        /// Place impulses on a linear grid
        #[arg(long)]
        linear: bool,

        /// Flatten each sequence's magnitude response before writing
        #[arg(long)]
        optimize: bool,

        /// Search sweeps per channel when optimizing
        #[arg(long, default_value_t = 60)]
        iterations: usize,
    },

    /// Summarize a table
    Inspect {
        /// Table path or name in the tables directory
        file: String,

        /// Sample rate to interpret the table at
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
    },
}

pub fn run(args: TableArgs) -> anyhow::Result<()> {
    match args.command {
        TableCommand::Generate {
            output,
            seed,
            sample_rate,
            length_ms,
            density,
            decay_db,
            linear,
            optimize,
            iterations,
        } => {
            let mut settings = WidenerSettings::with_seed(seed);
            if let Some(length_ms) = length_ms {
                settings.velvet.length_ms = length_ms;
            }
            if let Some(density) = density {
                settings.velvet.grid_density = density;
            }
            if let Some(decay_db) = decay_db {
                settings.velvet.decay_db = decay_db;
            }
            settings.velvet.log_distribution = !linear;

            let sample_rate = sample_rate as f32;
            let (table, results) = if optimize {
                let config = OptimizeConfig {
                    max_iterations: iterations,
                    ..OptimizeConfig::default()
                };
                DecorrelationTable::generate_optimized(&settings, sample_rate, &config)
            } else {
                (DecorrelationTable::generate(&settings, sample_rate), Vec::new())
            };

            match output {
                Some(path) => {
                    table.save(&path)?;
                    println!("Wrote {} channels to {}", CHANNELS, path.display());
                    for (channel, result) in results.iter().enumerate() {
                        println!("{}", optimization_summary(channel, result));
                    }
                }
                None => {
                    // Keep stdout a loadable table.
                    for (channel, result) in results.iter().enumerate() {
                        eprintln!("{}", optimization_summary(channel, result));
                    }
                    print!("{}", table.as_str());
                }
            }
            Ok(())
        }
        TableCommand::Inspect { file, sample_rate } => {
            let path = find_table(&file)
                .ok_or_else(|| anyhow::anyhow!("decorrelation table '{file}' not found"))?;
            let table = DecorrelationTable::load(&path)?;
            let sample_rate = sample_rate as f32;

            println!("Table:    {}", path.display());
            println!("Channels: {}", table.channels());
            for channel in 0..table.channels() {
                let velvet = table.velvet(channel, sample_rate)?;
                print_channel(channel, &velvet, sample_rate);
            }
            Ok(())
        }
    }
}

fn optimization_summary(channel: usize, result: &OptimizedSequence) -> String {
    format!(
        "[{channel}] coloration {:.2} dB -> {:.2} dB ({} sweeps)",
        result.initial_cost, result.cost, result.iterations
    )
}

fn print_channel(channel: usize, velvet: &VelvetNoise, sample_rate: f32) {
    let config = velvet.config();
    let (low, high) = response_spread(velvet, sample_rate);
    println!("\n[{channel}]");
    println!("  impulses:  {}", velvet.len());
    println!("  length:    {:.2} ms", config.length_ms);
    println!("  density:   {:.0} /s", config.grid_density);
    println!("  energy:    {:.4}", velvet.energy());
    println!(
        "  first:     {:?}",
        velvet.positions().iter().take(8).collect::<Vec<_>>()
    );
    println!("  response:  {low:+.1} .. {high:+.1} dB (50 Hz - Nyquist)");
    println!(
        "  coloration: {:.2} dB",
        coloration(
            velvet.positions(),
            velvet.values(),
            sample_rate,
            OptimizeConfig::default().freq_bins
        )
    );
}

/// Smallest and largest magnitude response in dB over log-spaced
/// frequencies from 50 Hz to just below Nyquist.
fn response_spread(velvet: &VelvetNoise, sample_rate: f32) -> (f32, f32) {
    const POINTS: usize = 64;
    let nyquist = sample_rate * 0.5;
    let start = 50.0f32.min(nyquist * 0.5);
    let ratio = (nyquist * 0.99 / start).powf(1.0 / (POINTS - 1) as f32);

    let mut low = f32::INFINITY;
    let mut high = f32::NEG_INFINITY;
    for k in 0..POINTS {
        let omega = 2.0 * PI * start * ratio.powi(k as i32) / sample_rate;
        let (mut re, mut im) = (0.0f32, 0.0f32);
        for (&position, &value) in velvet.positions().iter().zip(velvet.values()) {
            let phase = omega * position as f32;
            re += value * phase.cos();
            im -= value * phase.sin();
        }
        let db = to_db(re.hypot(im));
        low = low.min(db);
        high = high.max(db);
    }
    (low, high)
}
