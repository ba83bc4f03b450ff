use super::{GeneratorState, SignalGenerator};

/// A linear decay envelope
///
/// Falls from 1.0 at the first sample toward 0.0 at the end of its duration:
/// `e[n] = 1 - n / duration`. There is no attack or sustain phase, so a note
/// starts at full amplitude and fades out, which keeps consecutive notes from
/// clicking against each other.
pub struct DecayEnvelope {
    /// Current sample position
    position: usize,
    /// Total duration in samples
    duration: usize,
    /// Whether the envelope has completed
    completed: bool,
}

impl DecayEnvelope {
    /// Create a new decay envelope
    ///
    /// # Arguments
    /// * `duration_samples` - Duration of the decay in samples. A zero-length
    ///   envelope is complete immediately.
    ///
    /// # Example
    /// ```
    /// use solfa::generator::DecayEnvelope;
    ///
    /// let env = DecayEnvelope::new(8192); // 1 second at 8192 Hz
    /// assert_eq!(env.duration(), 8192);
    /// ```
    pub fn new(duration_samples: usize) -> Self {
        Self {
            position: 0,
            duration: duration_samples,
            completed: duration_samples == 0,
        }
    }

    /// Get the current position in samples
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the total duration in samples
    pub fn duration(&self) -> usize {
        self.duration
    }

    /// Envelope value at an absolute sample index
    pub fn value_at(&self, index: usize) -> f32 {
        if index >= self.duration {
            return 0.0;
        }
        (1.0 - index as f64 / self.duration as f64) as f32
    }
}

impl SignalGenerator for DecayEnvelope {
    fn process(&mut self, buffer: &mut [f32]) -> GeneratorState {
        if self.completed {
            buffer.fill(0.0);
            return GeneratorState::Complete;
        }

        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample = self.value_at(self.position + i);
        }

        self.position += buffer.len();

        if self.position >= self.duration {
            self.completed = true;
            GeneratorState::Complete
        } else {
            GeneratorState::Running
        }
    }

    fn is_complete(&self) -> bool {
        self.completed
    }

    fn reset(&mut self) {
        self.position = 0;
        self.completed = self.duration == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_basic() {
        let mut env = DecayEnvelope::new(10);
        let mut buffer = [0.0f32; 5];

        let state = env.process(&mut buffer);
        assert_eq!(state, GeneratorState::Running);
        assert!(!env.is_complete());

        // 1.0, 0.9, 0.8, 0.7, 0.6
        assert_eq!(buffer[0], 1.0);
        assert!((buffer[4] - 0.6).abs() < 1e-6);

        let state = env.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);
        assert!(env.is_complete());

        // Last sample is one step above zero, never zero itself
        assert!((buffer[4] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_decay_is_monotonic() {
        let mut env = DecayEnvelope::new(64);
        let mut buffer = [0.0f32; 64];
        env.process(&mut buffer);

        for pair in buffer.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        assert!(buffer.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_decay_post_completion() {
        let mut env = DecayEnvelope::new(5);
        let mut buffer = [1.0f32; 10];

        let state = env.process(&mut buffer);
        assert_eq!(state, GeneratorState::Complete);

        assert_eq!(buffer[0], 1.0);
        assert_eq!(buffer[5], 0.0);
        assert_eq!(buffer[9], 0.0);
    }

    #[test]
    fn test_decay_reset() {
        let mut env = DecayEnvelope::new(10);
        let mut buffer = [0.0f32; 10];
        env.process(&mut buffer);
        assert!(env.is_complete());

        env.reset();
        assert!(!env.is_complete());
        assert_eq!(env.position(), 0);

        let mut buffer2 = [0.0f32; 10];
        env.process(&mut buffer2);
        assert_eq!(buffer, buffer2);
    }

    #[test]
    fn test_zero_duration() {
        let mut env = DecayEnvelope::new(0);
        assert!(env.is_complete());

        let mut buffer = [1.0f32; 4];
        assert_eq!(env.process(&mut buffer), GeneratorState::Complete);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
