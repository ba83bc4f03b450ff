//! CLI tool for rendering a staff file to audio
//!
//! Usage: play <input.txt> [output.wav] [--sample-rate HZ]
//!
//! If output is not specified, generates <input>.wav

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use solfa::pipeline::{RenderConfig, ScoreRenderer, DEFAULT_SAMPLE_RATE};
use solfa::staff::load_score;

/// Render a staff notation file to a 24-bit WAV file
#[derive(Parser, Debug)]
#[command(name = "play")]
#[command(about = "Render a staff notation file to a WAV file", long_about = None)]
struct Args {
    /// Path to the staff file (.txt)
    input: PathBuf,

    /// Output WAV file path (defaults to <input>.wav)
    output: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("wav"));

    let score = load_score(&args.input)
        .with_context(|| format!("cannot load {}", args.input.display()))?;

    println!(
        "Parsed {} section(s), tempo {} bpm, loop {}",
        score.sections().len(),
        score.tempo(),
        score.loop_spec()
    );

    let config = RenderConfig {
        sample_rate: args.sample_rate,
        ..Default::default()
    };
    println!("Configuration:");
    println!("  Sample rate: {} Hz", config.sample_rate);
    println!("  Frame size: {} samples", config.frame_size);
    println!();

    println!("Rendering audio...");
    let waveform = ScoreRenderer::new(config)
        .render_to_wav(&score, &output)
        .with_context(|| format!("cannot render {}", args.input.display()))?;

    println!(
        "✓ Generated {} ({:.2}s, peak {:.3})",
        output.display(),
        waveform.duration_secs(),
        waveform.peak()
    );

    Ok(())
}
