pub mod decay;
pub mod tone;

pub use decay::DecayEnvelope;
pub use tone::{frequency, sample_count, SynthesisError, ToneGenerator, ToneSynthesizer};

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for all signal generators
///
/// Signal generators produce audio samples frame by frame.
/// Each generator is independent and owns all of its state.
pub trait SignalGenerator {
    /// Process the next frame of samples
    ///
    /// # Arguments
    /// * `buffer` - Mutable slice to write samples into. The length determines frame size.
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the generator is still active
    /// * `GeneratorState::Complete` if the generator has finished
    ///
    /// # Note
    /// Samples past the end of the generator are filled with zeros.
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its initial state
    fn reset(&mut self);
}

/// Pull exactly `total` samples out of a generator, `frame_size` samples at a time
///
/// The last frame is truncated so the result never exceeds `total`.
pub fn collect_samples<G: SignalGenerator>(
    generator: &mut G,
    total: usize,
    frame_size: usize,
) -> Vec<f32> {
    let frame_size = frame_size.max(1);
    let mut samples = Vec::with_capacity(total);
    let mut frame_buffer = vec![0.0f32; frame_size];

    while samples.len() < total {
        let state = generator.process(&mut frame_buffer);
        let wanted = (total - samples.len()).min(frame_size);
        samples.extend_from_slice(&frame_buffer[..wanted]);

        if state == GeneratorState::Complete {
            break;
        }
    }

    // A generator that completes early leaves silence behind it
    samples.resize(total, 0.0);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_samples_truncates_last_frame() {
        let mut env = DecayEnvelope::new(100);
        let samples = collect_samples(&mut env, 100, 64);

        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0], 1.0);
        assert!(env.is_complete());
    }

    #[test]
    fn test_collect_samples_pads_short_generator() {
        let mut env = DecayEnvelope::new(10);
        let samples = collect_samples(&mut env, 20, 4);

        assert_eq!(samples.len(), 20);
        assert!(samples[10..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_collect_samples_zero_frame_size() {
        let mut env = DecayEnvelope::new(5);
        let samples = collect_samples(&mut env, 5, 0);
        assert_eq!(samples.len(), 5);
    }
}
