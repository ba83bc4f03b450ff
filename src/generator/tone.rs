use super::decay::DecayEnvelope;
use super::{collect_samples, GeneratorState, SignalGenerator};
use crate::pipeline::score::Note;
use std::f64::consts::TAU;

/// Reference pitch for octave offset 0, degree 1
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Scale degree that marks a rest
pub const REST_DEGREE: i32 = -1;

/// Highest chromatic scale degree ("si")
pub const MAX_DEGREE: i32 = 12;

/// Largest octave offset in either direction
pub const MAX_OCTAVE_OFFSET: i32 = 32;

/// Longest note, in samples, that a synthesizer will render
pub const MAX_NOTE_SAMPLES: usize = 1 << 28;

/// Errors raised when note parameters cannot be synthesized
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("scale degree {0} outside -1 (rest) or 1..=12")]
    InvalidDegree(i32),
    #[error("octave offset {0} outside -32..=32")]
    InvalidOctave(i32),
    #[error("duration {0} must be a positive number of beats")]
    InvalidDuration(f64),
    #[error("note of {0} beats is too long to render")]
    DurationTooLong(f64),
    #[error("tempo must be a positive number of beats per minute")]
    InvalidTempo,
    #[error("sample rate must be positive")]
    InvalidSampleRate,
}

/// Check that an octave, degree and duration describe a playable note
///
/// The octave of a rest is ignored.
pub fn check_note(
    octave_offset: i32,
    degree: i32,
    duration_units: f64,
) -> Result<(), SynthesisError> {
    if degree != REST_DEGREE {
        if !(1..=MAX_DEGREE).contains(&degree) {
            return Err(SynthesisError::InvalidDegree(degree));
        }
        if !(-MAX_OCTAVE_OFFSET..=MAX_OCTAVE_OFFSET).contains(&octave_offset) {
            return Err(SynthesisError::InvalidOctave(octave_offset));
        }
    }
    if !duration_units.is_finite() || duration_units <= 0.0 {
        return Err(SynthesisError::InvalidDuration(duration_units));
    }
    Ok(())
}

/// Frequency of a scale degree
///
/// Formula: f = 440 * 2^octave_offset * 2^((degree - 1) / 12)
///
/// Degrees past 12 keep climbing, so degree 13 lands on degree 1 of the next
/// octave. No validation happens here.
pub fn frequency(octave_offset: i32, degree: i32) -> f64 {
    REFERENCE_FREQUENCY * 2f64.powi(octave_offset) * 2f64.powf((degree - 1) as f64 / 12.0)
}

/// Number of samples for a note lasting `duration_units` beats
///
/// Notes longer than [`MAX_NOTE_SAMPLES`] are rejected.
pub fn sample_count(
    duration_units: f64,
    tempo: u32,
    sample_rate: u32,
) -> Result<usize, SynthesisError> {
    if tempo == 0 {
        return Err(SynthesisError::InvalidTempo);
    }

    let seconds = duration_units * 60.0 / tempo as f64;
    let samples = (sample_rate as f64 * seconds).round();
    if !samples.is_finite() || samples > MAX_NOTE_SAMPLES as f64 {
        return Err(SynthesisError::DurationTooLong(duration_units));
    }
    Ok(samples as usize)
}

/// A decaying sine tone
///
/// y[n] = sin(2π * f * n / sample_rate) * e[n], where e[n] is a
/// [`DecayEnvelope`] spanning the whole note. Rests produce silence of the
/// same length.
pub struct ToneGenerator {
    /// Phase increment per sample in radians
    phase_per_sample: f64,
    silent: bool,
    envelope: DecayEnvelope,
    envelope_buffer: Vec<f32>,
}

impl ToneGenerator {
    /// Create a tone at `frequency` Hz lasting `duration_samples` samples
    pub fn new(frequency: f64, sample_rate: u32, duration_samples: usize) -> Self {
        Self {
            phase_per_sample: TAU * frequency / sample_rate as f64,
            silent: false,
            envelope: DecayEnvelope::new(duration_samples),
            envelope_buffer: Vec::new(),
        }
    }

    /// Create a silent generator lasting `duration_samples` samples
    pub fn rest(duration_samples: usize) -> Self {
        Self {
            phase_per_sample: 0.0,
            silent: true,
            envelope: DecayEnvelope::new(duration_samples),
            envelope_buffer: Vec::new(),
        }
    }

    /// Total length of the tone in samples
    pub fn duration(&self) -> usize {
        self.envelope.duration()
    }

    /// Whether this generator only produces silence
    pub fn is_rest(&self) -> bool {
        self.silent
    }
}

impl SignalGenerator for ToneGenerator {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        if self.is_rest() {
            buffer.fill(0.0);
            // The envelope only keeps time for rests
            self.envelope_buffer.resize(buffer.len(), 0.0);
            return self.envelope.process(&mut self.envelope_buffer);
        }

        let start = self.envelope.position();
        self.envelope_buffer.resize(buffer.len(), 0.0);
        let state = self.envelope.process(&mut self.envelope_buffer);

        for (i, sample) in buffer.iter_mut().enumerate() {
            let phase = self.phase_per_sample * (start + i) as f64;
            *sample = phase.sin() as f32 * self.envelope_buffer[i];
        }

        state
    }

    fn is_complete(&self) -> bool {
        self.envelope.is_complete()
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }
}

/// Turns single notes into sample buffers at a fixed sample rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    frame_size: usize,
}

impl ToneSynthesizer {
    /// Create a synthesizer
    ///
    /// # Arguments
    /// * `sample_rate` - Output sample rate in Hz
    /// * `frame_size` - Number of samples generated per frame
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        Self {
            sample_rate,
            frame_size,
        }
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Build the generator for a note without running it
    pub fn generator(&self, note: &Note, tempo: u32) -> Result<ToneGenerator, SynthesisError> {
        if self.sample_rate == 0 {
            return Err(SynthesisError::InvalidSampleRate);
        }
        if tempo == 0 {
            return Err(SynthesisError::InvalidTempo);
        }
        check_note(note.octave_offset, note.degree, note.duration_units)?;

        let samples = sample_count(note.duration_units, tempo, self.sample_rate)?;
        if note.is_rest() {
            return Ok(ToneGenerator::rest(samples));
        }

        let frequency = frequency(note.octave_offset, note.degree);
        Ok(ToneGenerator::new(frequency, self.sample_rate, samples))
    }

    /// Render a whole note into a new buffer
    ///
    /// # Example
    /// ```
    /// use solfa::generator::ToneSynthesizer;
    /// use solfa::pipeline::Note;
    ///
    /// let synth = ToneSynthesizer::new(8192, 64);
    /// let note = Note::new(0, 1, 0.5).unwrap();
    ///
    /// // Half a beat at 60 bpm is half a second
    /// let samples = synth.synthesize(&note, 60).unwrap();
    /// assert_eq!(samples.len(), 4096);
    /// ```
    pub fn synthesize(&self, note: &Note, tempo: u32) -> Result<Vec<f32>, SynthesisError> {
        let mut generator = self.generator(note, tempo)?;
        let total = generator.duration();
        Ok(collect_samples(&mut generator, total, self.frame_size))
    }
}
