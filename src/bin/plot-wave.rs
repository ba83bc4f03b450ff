use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use plotters::prelude::*;
use solfa::pipeline::{RenderConfig, ScoreRenderer, Waveform, DEFAULT_SAMPLE_RATE};
use solfa::staff::load_score;

/// Most points drawn; longer waveforms are decimated to min/max pairs
const MAX_POINTS: usize = 20_000;

/// Render a staff notation file and plot its waveform as SVG
#[derive(Parser, Debug)]
#[command(name = "plot-wave")]
#[command(about = "Plot the rendered waveform of a staff file", long_about = None)]
struct Args {
    /// Path to the staff file (.txt)
    input: PathBuf,

    /// Output SVG path
    output: PathBuf,

    /// Render sample rate in Hz
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,
}

/// Reduce a waveform to at most `MAX_POINTS` (time, amplitude) points,
/// keeping the minimum and maximum of every bucket so peaks stay visible
fn plot_points(waveform: &Waveform) -> Vec<(f32, f32)> {
    let samples = waveform.samples();
    let rate = waveform.sample_rate() as f32;
    let bucket = (samples.len() * 2 / MAX_POINTS).max(1);

    if bucket == 1 {
        return samples
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as f32 / rate, s))
            .collect();
    }

    let mut points = Vec::with_capacity(MAX_POINTS);
    for (chunk_index, chunk) in samples.chunks(bucket).enumerate() {
        let t = (chunk_index * bucket) as f32 / rate;
        let (min, max) = chunk
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        points.push((t, min));
        points.push((t, max));
    }
    points
}

fn create_plot(args: &Args, waveform: &Waveform) -> Result<()> {
    let root = SVGBackend::new(&args.output, (1200, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let duration = waveform.duration_secs() as f32;
    let peak = waveform.peak().max(1.0) * 1.1;

    let title = format!(
        "{}: {:.2}s at {} Hz",
        args.input.display(),
        duration,
        waveform.sample_rate()
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..duration.max(f32::EPSILON), -peak..peak)
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(10)
        .draw()
        .map_err(|e| anyhow!("{:?}", e))?;

    chart
        .draw_series(LineSeries::new(plot_points(waveform), BLUE.stroke_width(1)))
        .map_err(|e| anyhow!("{:?}", e))?;

    root.present().map_err(|e| anyhow!("{:?}", e))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Waveform Plot Generator");
    println!("=======================");

    let score = load_score(&args.input)
        .with_context(|| format!("cannot load {}", args.input.display()))?;

    print!("  Rendering... ");
    let waveform = ScoreRenderer::new(RenderConfig {
        sample_rate: args.sample_rate,
        ..Default::default()
    })
    .render(&score)
    .with_context(|| format!("cannot render {}", args.input.display()))?;
    println!(
        "done ({} samples, {:.2}s)",
        waveform.len(),
        waveform.duration_secs()
    );

    print!("  Creating plot... ");
    create_plot(&args, &waveform)?;
    println!("done");

    println!();
    println!("Output: {}", args.output.display());

    Ok(())
}
