//! eqtool: inspect equalizer presets from the command line
//!
//! Usage:
//!   eqtool curve <preset>        - Print the magnitude response
//!   eqtool auto-gain <preset>    - Print the auto-gain compensation and adjusted preset
//!   eqtool convert <preset>      - Convert between JSON and delimited text
//!   eqtool verify <preset>       - Render test sines and compare with the response

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use eq_dsp::response::{DEFAULT_POINT_COUNT, cascade_magnitude_db, measure_sine_amplitude};
use eq_engine::{EngineConfig, EqRenderer, EqualizerEngine, Preset};

#[derive(Parser)]
#[command(name = "eqtool", about = "10-band equalizer preset tool")]
struct Cli {
    /// Engine settings as JSON (sampleRateHz, bufferSizeFrames, maxChannels)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the sample rate
    #[arg(short, long, global = true)]
    sample_rate: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the magnitude response of a preset
    Curve {
        preset: PathBuf,
        /// Number of log-spaced points
        #[arg(short, long, default_value_t = DEFAULT_POINT_COUNT)]
        points: usize,
        /// Clamp gains to the ±15 dB plot range
        #[arg(long)]
        display: bool,
        /// Emit JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },
    /// Compute auto-gain compensation and print the adjusted preset
    AutoGain { preset: PathBuf },
    /// Convert a preset to another interchange format
    Convert {
        preset: PathBuf,
        #[arg(short, long, value_enum, default_value = "json")]
        to: Format,
    },
    /// Render test sines and compare measured gain with the response
    Verify {
        preset: PathBuf,
        /// Test frequencies in Hz
        #[arg(short, long, value_delimiter = ',', default_values_t = vec![100.0, 1000.0, 10000.0])]
        frequencies: Vec<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = engine_config(cli.config.as_deref(), cli.sample_rate)?;

    match cli.command {
        Commands::Curve {
            preset,
            points,
            display,
            json,
        } => print_curve(config, &preset, points, display, json),
        Commands::AutoGain { preset } => auto_gain(config, &preset),
        Commands::Convert { preset, to } => convert(&preset, to),
        Commands::Verify {
            preset,
            frequencies,
        } => verify(config, &preset, &frequencies),
    }
}

fn engine_config(path: Option<&Path>, sample_rate: Option<f64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EngineConfig::from_json_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(sr) = sample_rate {
        config.sample_rate_hz = sr;
    }
    config.validate()?;
    Ok(config)
}

/// `.json` files are preset records, anything else is delimited text
fn load_preset(path: &Path) -> Result<Preset> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading preset {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let preset = if is_json {
        Preset::from_json(&text)?
    } else {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Preset::from_delimited(&name, &text)?
    };
    log::info!("Loaded preset '{}' ({} mode)", preset.name, preset.mode());
    Ok(preset)
}

fn engine_with_preset(config: EngineConfig, path: &Path) -> Result<(EqualizerEngine, EqRenderer)> {
    let preset = load_preset(path)?;
    let (mut engine, renderer) = EqualizerEngine::initialize(config)?;
    engine
        .apply_preset(&preset)
        .with_context(|| format!("applying preset '{}'", preset.name))?;
    Ok((engine, renderer))
}

fn print_curve(
    config: EngineConfig,
    path: &Path,
    points: usize,
    display: bool,
    json: bool,
) -> Result<()> {
    let (engine, _renderer) = engine_with_preset(config, path)?;
    let curve = engine.frequency_response(points);
    let pairs = if display {
        curve.display_points()
    } else {
        curve.to_pairs()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
    } else {
        for (freq, gain) in pairs {
            println!("{freq:.2}\t{gain:.4}");
        }
    }
    Ok(())
}

fn auto_gain(config: EngineConfig, path: &Path) -> Result<()> {
    let (mut engine, _renderer) = engine_with_preset(config, path)?;
    let compensation = engine.apply_auto_gain();
    let name = load_preset(path)?.name;

    eprintln!("compensation: {compensation:+.3} dB");
    println!("{}", engine.capture_preset(&name).to_json()?);
    Ok(())
}

fn convert(path: &Path, to: Format) -> Result<()> {
    let preset = load_preset(path)?;
    match to {
        Format::Json => println!("{}", preset.to_json()?),
        Format::Text => print!("{}", preset.to_delimited()),
    }
    Ok(())
}

fn verify(config: EngineConfig, path: &Path, frequencies: &[f64]) -> Result<()> {
    let (engine, mut renderer) = engine_with_preset(config, path)?;
    let sample_rate = engine.sample_rate();
    let cascade = engine.active_cascade();
    let len = sample_rate as usize;
    let block = config.buffer_size_frames;

    let mut worst: f64 = 0.0;
    for &freq in frequencies {
        if !(freq > 0.0 && freq < sample_rate / 2.0) {
            bail!("test frequency {freq} Hz outside (0, {}) Hz", sample_rate / 2.0);
        }

        let input: Vec<f64> = (0..2 * len)
            .map(|n| (2.0 * std::f64::consts::PI * freq * n as f64 / sample_rate).sin())
            .collect();
        let mut output = input.clone();
        for chunk in output.chunks_mut(block) {
            renderer.process_mono(chunk);
        }

        let measured = measure_sine_amplitude(&output[len..], freq, sample_rate)
            / measure_sine_amplitude(&input[len..], freq, sample_rate);
        let measured_db = 20.0 * measured.log10();
        let predicted_db = cascade_magnitude_db(&cascade, freq, sample_rate);
        worst = worst.max((measured_db - predicted_db).abs());

        println!("{freq:>10.2} Hz  predicted {predicted_db:+.6} dB  measured {measured_db:+.6} dB");
    }

    println!("max deviation: {worst:.3e} dB");
    Ok(())
}
