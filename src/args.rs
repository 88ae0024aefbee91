use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use sweep_tone::{config::SessionConfig, SweepMode};

#[derive(Parser, Debug)]
#[command(name = "sweep-tone")]
#[command(version, about = "Plays a sine tone sweeping between two frequencies.")]
pub struct Args {
    /// JSON file with session defaults, overridden by any flags given
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output device, matched by name similarity
    #[arg(short, long, global = true, default_value = "default")]
    pub output_device: String,

    /// Input device used by --detect
    #[arg(short, long, global = true, default_value = "default")]
    pub input_device: String,

    /// Window applied before detection: hann or square
    #[arg(short, long, global = true, default_value = "hann")]
    pub window: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sweeps continuously, computing the frequency for every sample
    #[command(alias = "s")]
    Sweep(SweepArgs),

    /// Plays a target frequency, updated ten times a second
    #[command(alias = "t")]
    Tone(ToneArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SweepArgs {
    /// Lower sweep bound in Hz
    #[arg(short, long)]
    pub min: Option<f64>,

    /// Upper sweep bound in Hz
    #[arg(short = 'M', long)]
    pub max: Option<f64>,

    /// Sample rate in Hz
    #[arg(short, long)]
    pub rate: Option<u32>,

    #[arg(short, long)]
    pub channels: Option<u16>,

    /// Playback length in seconds, 0 plays until a key is pressed
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Sweep cycles per second
    #[arg(short, long)]
    pub sweep: Option<f64>,

    /// linear, sine, triangle, exponential, logarithmic, square, sawtooth or random
    #[arg(long)]
    pub mode: Option<SweepMode>,

    #[arg(short, long)]
    pub amplitude: Option<f64>,

    /// Fade-in length in milliseconds
    #[arg(long)]
    pub fade_in: Option<u64>,

    /// Seed for random sweeps
    #[arg(long)]
    pub seed: Option<u64>,

    /// Listen on the input device and compare the detected frequency
    #[arg(long)]
    pub detect: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ToneArgs {
    /// Target frequency in Hz
    #[arg(short, long, default_value_t = 440.0)]
    pub frequency: f64,

    /// Lower bound in Hz, defaults to the target for a steady tone
    #[arg(short, long)]
    pub min: Option<f64>,

    #[arg(short, long)]
    pub volume: Option<f64>,

    #[arg(long)]
    pub mode: Option<SweepMode>,

    /// Sweep cycles per second
    #[arg(short, long)]
    pub sweep: Option<f64>,

    /// Playback length in seconds, 0 plays until a key is pressed
    #[arg(short, long)]
    pub duration: Option<f64>,

    #[arg(long)]
    pub detect: bool,
}

impl Command {
    pub fn detect(&self) -> bool {
        match self {
            Command::Sweep(x) => x.detect,
            Command::Tone(x) => x.detect,
        }
    }

    /// Writes every flag that was given over the loaded config.
    pub fn apply(&self, config: &mut SessionConfig) {
        match self {
            Command::Sweep(args) => {
                config.continuous = true;
                set(&mut config.min_frequency, args.min);
                set(&mut config.max_frequency, args.max);
                set(&mut config.sample_rate, args.rate);
                set(&mut config.channels, args.channels);
                set(&mut config.duration_ms, args.duration.map(secs_to_ms));
                set(&mut config.sweep_rate, args.sweep);
                set(&mut config.sweep_mode, args.mode);
                set(&mut config.amplitude, args.amplitude);
                set(&mut config.fade_in_ms, args.fade_in);
                if args.seed.is_some() {
                    config.seed = args.seed;
                }
            }
            Command::Tone(args) => {
                config.continuous = false;
                config.max_frequency = args.frequency;
                config.min_frequency = args.min.unwrap_or(args.frequency);
                set(&mut config.volume, args.volume);
                set(&mut config.sweep_mode, args.mode);
                set(&mut config.sweep_rate, args.sweep);
                set(&mut config.duration_ms, args.duration.map(secs_to_ms));
            }
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}
