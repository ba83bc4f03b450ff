//! Score renderer
//!
//! Drives the whole pipeline: expand the loop into playback order, mix each
//! section's voices, and concatenate the section buffers into one waveform.

use std::path::Path;

use log::{debug, info};

use crate::generator::tone::{SynthesisError, ToneSynthesizer};
use crate::pipeline::looper::expand;
use crate::pipeline::mixer::VoiceMixer;
use crate::pipeline::parser::MalformedScoreError;
use crate::pipeline::score::{Score, Section};
use crate::wav::write_wav_24bit;

/// Default output sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 8192;

/// Default number of samples generated per frame
pub const DEFAULT_FRAME_SIZE: usize = 64;

/// Configuration for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of samples per generator frame
    pub frame_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_size: DEFAULT_FRAME_SIZE,
        }
    }
}

/// Render errors
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("malformed score: {0}")]
    Malformed(#[from] MalformedScoreError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("failed to write audio: {0}")]
    Wav(#[from] hound::Error),
}

/// A rendered mono waveform
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap `samples` recorded at `sample_rate` Hz
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Sample values, nominally in [-1.0, 1.0] but never clipped
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the waveform holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}

/// Renders parsed scores into waveforms
#[derive(Debug, Clone, Copy)]
pub struct ScoreRenderer {
    config: RenderConfig,
    mixer: VoiceMixer,
}

impl ScoreRenderer {
    /// Create a new renderer
    ///
    /// # Arguments
    /// * `config` - Sample rate and frame size
    pub fn new(config: RenderConfig) -> Self {
        let synth = ToneSynthesizer::new(config.sample_rate, config.frame_size);
        Self {
            config,
            mixer: VoiceMixer::new(synth),
        }
    }

    /// Configuration the renderer was built with
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a single section at `tempo`
    ///
    /// Long scores can be rendered section by section with this and the
    /// playback order from [`expand`].
    pub fn render_section(
        &self,
        section: &Section,
        tempo: u32,
    ) -> Result<Vec<f32>, SynthesisError> {
        self.mixer.mix(section.voices(), tempo)
    }

    /// Render a whole score
    ///
    /// # Example
    /// ```
    /// use solfa::pipeline::{parse_score, RenderConfig, ScoreRenderer};
    ///
    /// let score = parse_score(
    ///     "rythm=60 loop=(1,1,1,False)
    ///      <section>
    ///      (0,1,1)
    ///      </section>",
    /// )
    /// .unwrap();
    ///
    /// let waveform = ScoreRenderer::new(RenderConfig::default()).render(&score).unwrap();
    /// // One beat at 60 bpm, played twice
    /// assert_eq!(waveform.len(), 2 * 8192);
    /// ```
    pub fn render(&self, score: &Score) -> Result<Waveform, RenderError> {
        // Each distinct section is mixed once; repeats reference the same buffer
        let mixed = score
            .sections()
            .iter()
            .enumerate()
            .map(|(i, section)| -> Result<Vec<f32>, SynthesisError> {
                let samples = self.render_section(section, score.tempo())?;
                debug!("section {}: {} samples", i + 1, samples.len());
                Ok(samples)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let order = expand(&mixed, score.loop_spec())?;
        let total = order.iter().map(|buffer| buffer.len()).sum();

        let mut samples = Vec::with_capacity(total);
        for buffer in &order {
            samples.extend_from_slice(buffer);
        }

        let waveform = Waveform::new(samples, self.config.sample_rate);
        info!(
            "rendered {} section instance(s), {} samples ({:.2}s at {} Hz)",
            order.len(),
            waveform.len(),
            waveform.duration_secs(),
            waveform.sample_rate()
        );

        Ok(waveform)
    }

    /// Render a score and write it as a 24-bit WAV file
    ///
    /// The file is only created once rendering has succeeded.
    pub fn render_to_wav<P: AsRef<Path>>(
        &self,
        score: &Score,
        path: P,
    ) -> Result<Waveform, RenderError> {
        let waveform = self.render(score)?;
        write_wav_24bit(path, waveform.samples(), waveform.sample_rate())?;
        Ok(waveform)
    }
}

impl Default for ScoreRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}
