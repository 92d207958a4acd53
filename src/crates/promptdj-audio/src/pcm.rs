//! PCM16 chunk codec
//!
//! Chunks arrive as base64 text wrapping signed 16-bit little-endian
//! interleaved samples. The sample rate and channel count are fixed by the
//! session configuration, not carried in the payload.

use crate::{AudioBuffer, AudioError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decode a base64 PCM16 payload
pub fn decode_chunk(encoded: &str, sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AudioError::DecodeError(format!("Invalid base64: {}", e)))?;
    decode_pcm16(&bytes, sample_rate, channels)
}

/// Decode raw PCM16 little-endian bytes
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::DecodeError(format!(
            "Invalid format: {} Hz, {} channels",
            sample_rate, channels
        )));
    }

    if bytes.len() % 2 != 0 {
        return Err(AudioError::DecodeError(format!(
            "Odd byte count {} for 16-bit samples",
            bytes.len()
        )));
    }

    let sample_count = bytes.len() / 2;
    if sample_count % channels as usize != 0 {
        return Err(AudioError::DecodeError(format!(
            "{} samples do not fill whole {}-channel frames",
            sample_count, channels
        )));
    }

    // Convert s16 to f32: [-32768, 32767] -> [-1.0, 1.0]
    let data = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioBuffer::new(data, sample_rate, channels))
}

/// Encode a buffer as a base64 PCM16 payload
pub fn encode_chunk(buffer: &AudioBuffer) -> String {
    let mut bytes = Vec::with_capacity(buffer.data.len() * 2);
    for &sample in buffer.data.iter() {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_samples() {
        // 0, i16::MIN, 16384 as little-endian, mono
        let bytes = [0x00, 0x00, 0x00, 0x80, 0x00, 0x40];
        let buffer = decode_pcm16(&bytes, 48000, 1).unwrap();

        assert_eq!(buffer.data.as_slice(), &[0.0, -1.0, 0.5]);
        assert_eq!(buffer.frames(), 3);
    }

    #[test]
    fn test_decode_chunk_duration() {
        // One second of stereo silence at 48 kHz
        let bytes = vec![0u8; 48000 * 2 * 2];
        let encoded = STANDARD.encode(&bytes);

        let buffer = decode_chunk(&encoded, 48000, 2).unwrap();
        assert_eq!(buffer.duration(), 1.0);
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_chunk("not base64!!", 48000, 2).unwrap_err();
        assert!(matches!(err, AudioError::DecodeError(_)));
    }

    #[test]
    fn test_decode_rejects_odd_bytes() {
        assert!(decode_pcm16(&[0, 0, 0], 48000, 1).is_err());
    }

    #[test]
    fn test_decode_rejects_partial_frame() {
        // Three samples cannot be stereo
        assert!(decode_pcm16(&[0; 6], 48000, 2).is_err());
    }

    #[test]
    fn test_encode_then_decode_is_close() {
        let source = AudioBuffer::new(vec![0.25, -0.5, 0.999, -1.0], 48000, 2);
        let decoded = decode_chunk(&encode_chunk(&source), 48000, 2).unwrap();

        for (a, b) in source.data.iter().zip(decoded.data.iter()) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }
}
