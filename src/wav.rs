//! WAV file writer utility
//!
//! Writes mono 24-bit integer PCM through `hound`.

use std::fs;
use std::io::{Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, warn};

/// Bit depth of written files
pub const BITS_PER_SAMPLE: u16 = 24;

/// Largest 24-bit sample value
const I24_MAX: f32 = 8_388_607.0;

/// Convert a float sample to a 24-bit integer, clamping to [-1.0, 1.0]
///
/// NaN becomes silence.
fn to_i24(sample: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) * I24_MAX).round() as i32
}

/// Write every sample and return how many had to be clipped
fn write_samples<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    samples: &[f32],
) -> Result<usize, hound::Error> {
    let mut clipped = 0usize;
    for &sample in samples {
        if !sample.is_finite() || sample.abs() > 1.0 {
            clipped += 1;
        }
        writer.write_sample(to_i24(sample))?;
    }
    Ok(clipped)
}

/// Pass `result` through, removing the partially written file at `path` on error
fn discard_on_error<T>(path: &Path, result: Result<T, hound::Error>) -> Result<T, hound::Error> {
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove partial file {}: {}", path.display(), e);
        }
    }
    result
}

/// Write a 24-bit PCM WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `samples` - Audio samples (f32, nominal range [-1.0, 1.0])
/// * `sample_rate` - Sample rate in Hz
///
/// Samples outside [-1.0, 1.0] are clipped and non-finite samples are written
/// as silence; the number of such samples is logged as a warning. The writer
/// is finalized before returning, so the header always matches the data on
/// success. If writing fails after the file was created, the file is removed.
///
/// # Example
/// ```
/// use solfa::wav::write_wav_24bit;
///
/// let path = std::env::temp_dir().join("solfa_doc_silence.wav");
/// let samples = vec![0.0f32; 8192]; // 1 second of silence at 8192 Hz
/// write_wav_24bit(&path, &samples, 8192).unwrap();
/// # std::fs::remove_file(&path).unwrap();
/// ```
pub fn write_wav_24bit<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let path = path.as_ref();
    let mut writer = WavWriter::create(path, spec)?;

    let written = write_samples(&mut writer, samples)
        .and_then(|clipped| writer.finalize().map(|()| clipped));
    let clipped = discard_on_error(path, written)?;

    if clipped > 0 {
        warn!(
            "{} of {} samples were out of range and were clipped",
            clipped,
            samples.len()
        );
    }
    debug!(
        "wrote {} samples at {} Hz to {}",
        samples.len(),
        sample_rate,
        path.display()
    );

    Ok(())
}
