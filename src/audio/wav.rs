// WAV module - decode/encode PCM WAV files into `SampleBuffer`s
//
// Stands in for the capture provider on desktop: the CLI and the test suite
// load recordings from disk instead of a microphone.

use std::path::Path;

use super::SampleBuffer;
use crate::error::AnalysisError;

/// Decode a WAV file, down-mixing to mono
///
/// Integer formats are normalized to [-1, 1] by the largest positive value
/// of their bit depth.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, AnalysisError> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path).map_err(|err| {
        AnalysisError::SourceUnavailable {
            reason: format!("opening {}: {}", path.display(), err),
        }
    })?;
    let spec = reader.spec();

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, hound::Error>>()?,
        hound::SampleFormat::Int => {
            if !(8..=32).contains(&spec.bits_per_sample) {
                return Err(AnalysisError::SourceUnavailable {
                    reason: format!(
                        "unsupported bits per sample {} in {}",
                        spec.bits_per_sample,
                        path.display()
                    ),
                });
            }
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / max))
                .collect::<Result<Vec<f32>, hound::Error>>()?
        }
    };

    tracing::debug!(
        "[Wav] Loaded {} ({} Hz, {} channels, {} samples)",
        path.display(),
        spec.sample_rate,
        spec.channels,
        interleaved.len()
    );

    SampleBuffer::from_interleaved(&interleaved, spec.channels, spec.sample_rate)
}

/// Write a mono buffer as 32-bit float WAV
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &SampleBuffer) -> Result<(), AnalysisError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_roundtrip_preserves_samples() {
        let path = std::env::temp_dir().join(format!(
            "voiceprint_wav_roundtrip_{}.wav",
            std::process::id()
        ));
        let original = SampleBuffer::new(vec![0.0, 0.25, -0.5, 1.0], 22_050);
        write_wav(&path, &original).unwrap();
        let loaded = load_wav(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let result = load_wav("/definitely/not/here.wav");
        assert!(matches!(
            result,
            Err(AnalysisError::SourceUnavailable { .. })
        ));
    }
}
