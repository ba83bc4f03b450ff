//! Voice mixer for one section
//!
//! Renders every voice-line of a section on its own, then sums them sample by
//! sample. Voices are expected to line up in time; when their rendered
//! lengths differ, all of them are cut to the shortest one.

use log::debug;

use crate::generator::tone::{SynthesisError, ToneSynthesizer};
use crate::pipeline::score::VoiceLine;

/// Mixes the voice-lines of a section into one buffer
#[derive(Debug, Clone, Copy)]
pub struct VoiceMixer {
    synth: ToneSynthesizer,
}

impl VoiceMixer {
    /// Create a mixer that renders notes with `synth`
    pub fn new(synth: ToneSynthesizer) -> Self {
        Self { synth }
    }

    /// Render one voice-line: its notes back to back
    pub fn render_voice(
        &self,
        voice: &VoiceLine,
        tempo: u32,
    ) -> Result<Vec<f32>, SynthesisError> {
        let mut samples = Vec::new();
        for note in voice.notes() {
            samples.extend(self.synth.synthesize(note, tempo)?);
        }
        Ok(samples)
    }

    /// Render and sum all voices of a section
    ///
    /// The result is as long as the shortest voice. No clipping or
    /// normalization is applied; amplitudes simply add up.
    pub fn mix(&self, voices: &[VoiceLine], tempo: u32) -> Result<Vec<f32>, SynthesisError> {
        let rendered = voices
            .iter()
            .map(|voice| self.render_voice(voice, tempo))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sum_truncated(rendered))
    }
}

/// Sum buffers sample-wise, truncated to the shortest one
fn sum_truncated(buffers: Vec<Vec<f32>>) -> Vec<f32> {
    let mut buffers = buffers.into_iter();
    let Some(mut mixed) = buffers.next() else {
        return Vec::new();
    };

    for (i, buffer) in buffers.enumerate() {
        if buffer.len() != mixed.len() {
            debug!(
                "voice {} renders {} samples against {}, truncating",
                i + 2,
                buffer.len(),
                mixed.len()
            );
        }

        mixed.truncate(buffer.len());
        for (sample, &other) in mixed.iter_mut().zip(&buffer) {
            *sample += other;
        }
    }

    mixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::score::Note;

    fn create_test_mixer() -> VoiceMixer {
        VoiceMixer::new(ToneSynthesizer::new(8192, 64))
    }

    fn voice(notes: &[(i32, i32, f64)]) -> VoiceLine {
        VoiceLine::new(
            notes
                .iter()
                .map(|&(o, d, u)| Note::new(o, d, u).unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_render_voice_concatenates() {
        let mixer = create_test_mixer();
        let line = voice(&[(0, 1, 1.0), (0, -1, 0.5), (0, 5, 0.25)]);

        let samples = mixer.render_voice(&line, 60).unwrap();
        assert_eq!(samples.len(), 8192 + 4096 + 2048);

        // The rest sits between the two tones
        assert!(samples[8192..12288].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_mix_truncates_to_shortest() {
        let mixer = create_test_mixer();
        let long = voice(&[(0, 1, 2.0)]);
        let short = voice(&[(0, 5, 1.0), (0, 8, 0.5)]);

        let a = mixer.render_voice(&long, 60).unwrap();
        let b = mixer.render_voice(&short, 60).unwrap();
        assert_eq!(b.len(), 12288);

        let mixed = mixer.mix(&[long, short], 60).unwrap();
        assert_eq!(mixed.len(), b.len());

        for i in 0..mixed.len() {
            assert_eq!(mixed[i], a[i] + b[i]);
        }
    }

    #[test]
    fn test_mix_single_voice_is_unchanged() {
        let mixer = create_test_mixer();
        let line = voice(&[(1, 3, 0.5)]);

        let rendered = mixer.render_voice(&line, 120).unwrap();
        let mixed = mixer.mix(std::slice::from_ref(&line), 120).unwrap();
        assert_eq!(rendered, mixed);
    }

    #[test]
    fn test_mix_is_not_normalized() {
        let mixer = create_test_mixer();
        let line = voice(&[(0, 1, 1.0)]);

        let single = mixer.render_voice(&line, 60).unwrap();
        let mixed = mixer.mix(&[line.clone(), line.clone(), line], 60).unwrap();

        let peak_single = single.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let peak_mixed = mixed.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak_mixed > 1.0);
        assert!((peak_mixed - 3.0 * peak_single).abs() < 1e-4);
    }

    #[test]
    fn test_mix_no_voices() {
        let mixer = create_test_mixer();
        assert!(mixer.mix(&[], 60).unwrap().is_empty());
    }

    #[test]
    fn test_mix_propagates_synthesis_errors() {
        let mixer = create_test_mixer();
        let line = voice(&[(0, 1, 1.0)]);
        assert_eq!(mixer.mix(&[line], 0), Err(SynthesisError::InvalidTempo));
    }
}
