//! PCM encoding, volume metering, and the capture device seam.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Serialize;
use tokio::sync::mpsc;

use super::error::VoiceError;

/// Sample rate of microphone audio sent to the model.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;
/// Sample rate of model audio played back.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;
/// MIME type of outgoing audio chunks.
pub const PCM_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// RMS is small for normal speech; scale it so the meter moves.
const VOLUME_GAIN: f32 = 5.0;

/// Source of microphone frames.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    /// Open the microphone. Mono frames in `[-1.0, 1.0]` arrive on the
    /// returned channel until [`AudioCapture::stop`] is called.
    async fn start(&self, sample_rate: u32) -> Result<mpsc::Receiver<Vec<f32>>, VoiceError>;

    /// Release the microphone. Safe to call when not started.
    fn stop(&self);
}

/// One chunk of microphone audio, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioChunk {
    /// Base64 of little-endian PCM16.
    pub data: String,
    pub mime_type: &'static str,
}

impl AudioChunk {
    #[must_use]
    pub fn from_samples(samples: &[f32]) -> Self {
        Self {
            data: encode_pcm16(samples),
            mime_type: PCM_MIME_TYPE,
        }
    }
}

/// Encode float samples as base64 little-endian PCM16.
#[must_use]
pub fn encode_pcm16(samples: &[f32]) -> String {
    let bytes: Vec<u8> = samples
        .iter()
        .flat_map(|&s| {
            #[allow(clippy::cast_possible_truncation)] // clamped to the i16 range
            let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            v.to_le_bytes()
        })
        .collect();
    B64.encode(bytes)
}

/// Decode base64 little-endian PCM16 into float samples.
///
/// # Errors
///
/// Returns `VoiceError::Decode` if the input is not base64 or has an odd
/// number of bytes.
pub fn decode_pcm16(data: &str) -> Result<Vec<f32>, VoiceError> {
    let bytes = B64
        .decode(data)
        .map_err(|e| VoiceError::Decode(e.to_string()))?;
    if bytes.len() % 2 != 0 {
        return Err(VoiceError::Decode(format!(
            "odd PCM16 byte length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect())
}

/// Volume meter reading for one frame: RMS x 5, clamped to `[0, 1]`.
#[must_use]
pub fn rms_volume(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    #[allow(clippy::cast_precision_loss)] // frame lengths are far below 2^24
    let rms = (sum / samples.len() as f32).sqrt();
    (rms * VOLUME_GAIN).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_round_trip_is_close() {
        let samples = [0.0, 0.5, -0.5, 1.0, -1.0];
        let decoded = decode_pcm16(&encode_pcm16(&samples)).expect("decode");
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(&decoded) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
    }

    #[test]
    fn test_out_of_range_samples_clamp() {
        let decoded = decode_pcm16(&encode_pcm16(&[3.0, -7.0])).expect("decode");
        assert!(decoded[0] <= 1.0 && decoded[0] > 0.99);
        assert!(decoded[1] >= -1.0 && decoded[1] < -0.99);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_pcm16("not base64!").is_err());
        assert!(decode_pcm16(&B64.encode([1u8, 2, 3])).is_err());
    }

    #[test]
    fn test_chunk_mime_type() {
        let chunk = AudioChunk::from_samples(&[0.1; 160]);
        assert_eq!(chunk.mime_type, "audio/pcm;rate=16000");
        assert_eq!(B64.decode(&chunk.data).expect("base64").len(), 320);
    }

    #[test]
    fn test_rms_volume_scaled_and_clamped() {
        assert!(rms_volume(&[]).abs() < f32::EPSILON);
        assert!(rms_volume(&[0.0; 64]).abs() < f32::EPSILON);
        assert!((rms_volume(&[0.1; 64]) - 0.5).abs() < 1e-4);
        assert!((rms_volume(&[0.9; 64]) - 1.0).abs() < f32::EPSILON);
    }
}
