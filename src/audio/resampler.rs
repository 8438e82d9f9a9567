//! Sample-rate conversion using rubato's FFT resampler.
//!
//! Microphone audio is converted chunk by chunk inside the capture callback;
//! decoded speech clips are converted in one go before playback.

use anyhow::{Context, Result};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Input frames consumed per FFT pass.
const CHUNK_SIZE: usize = 1024;

/// Number of sub-chunks for FFT processing (higher = better quality but more CPU).
const SUB_CHUNKS: usize = 2;

/// Mono resampler that accepts input of any length.
///
/// Samples are buffered until a full chunk is available; [`flush`](Self::flush)
/// pads and converts whatever is left.
pub struct StreamResampler {
    resampler: Fft<f32>,
    pending: Vec<f32>,
    output: Vec<f32>,
    output_frames_max: usize,
}

impl StreamResampler {
    /// Create a resampler converting `from_rate` Hz to `to_rate` Hz.
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self> {
        let resampler = Fft::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, SUB_CHUNKS, 1, FixedSync::Input)
            .context("Failed to create resampler")?;
        let output_frames_max = resampler.output_frames_max();

        Ok(Self { resampler, pending: Vec::with_capacity(CHUNK_SIZE * 2), output: vec![0.0; output_frames_max], output_frames_max })
    }

    /// Queue samples and return everything that could be converted so far.
    pub fn push(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(samples);

        let mut converted = Vec::new();
        while self.pending.len() >= CHUNK_SIZE {
            let chunk: Vec<f32> = self.pending.drain(..CHUNK_SIZE).collect();
            self.convert_chunk(&chunk, &mut converted)?;
        }
        Ok(converted)
    }

    /// Convert the remaining buffered samples, zero-padding the last chunk.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        let mut converted = Vec::new();
        if self.pending.is_empty() {
            return Ok(converted);
        }

        let mut chunk = std::mem::take(&mut self.pending);
        chunk.resize(CHUNK_SIZE, 0.0);
        self.convert_chunk(&chunk, &mut converted)?;
        Ok(converted)
    }

    fn convert_chunk(&mut self, chunk: &[f32], out: &mut Vec<f32>) -> Result<()> {
        let input = InterleavedSlice::new(chunk, 1, CHUNK_SIZE).context("Failed to create input adapter")?;
        let mut output = InterleavedSlice::new_mut(&mut self.output, 1, self.output_frames_max).context("Failed to create output adapter")?;

        let (_, frames_written) =
            self.resampler.process_into_buffer(&input, &mut output, None).map_err(|e| anyhow::anyhow!("Resampling error: {}", e))?;

        out.extend_from_slice(&self.output[..frames_written]);
        Ok(())
    }
}

/// Resample a whole clip from one sample rate to another.
///
/// # Arguments
/// * `samples` - Mono input samples
/// * `from_rate` - Input sample rate (e.g., 24000 for synthesized speech)
/// * `to_rate` - Output sample rate (e.g., 48000 for the audio device)
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let mut resampler = StreamResampler::new(from_rate, to_rate)?;
    let mut output = resampler.push(samples)?;
    output.extend(resampler.flush()?);

    // Drop the padding added to the final chunk
    let expected_len = (samples.len() as f64 * to_rate as f64 / from_rate as f64) as usize;
    output.truncate(expected_len + 100);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_upsampling() {
        // 1 second of 24kHz speech to a 48kHz device
        let samples = vec![0.0; 24000];
        let result = resample(&samples, 24000, 48000).unwrap();
        assert!(result.len() >= 47000 && result.len() <= 48100, "got {}", result.len());
    }

    #[test]
    fn test_resample_downsampling() {
        // 1 second of 48kHz microphone input to 16kHz for recognition
        let samples = vec![0.0; 48000];
        let result = resample(&samples, 48000, 16000).unwrap();
        assert!(result.len() >= 15500 && result.len() <= 16100, "got {}", result.len());
    }

    #[test]
    fn test_same_rate_is_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
    }

    #[test]
    fn test_stream_buffers_partial_chunks() {
        let mut resampler = StreamResampler::new(48000, 16000).unwrap();
        assert!(resampler.push(&[0.0; 100]).unwrap().is_empty());
        assert!(!resampler.flush().unwrap().is_empty());
        assert!(resampler.flush().unwrap().is_empty());
    }
}
