//! Shared audio utilities for capture, playback and the speech services.

use std::io::Cursor;

use anyhow::{Context, Result};
use cpal::traits::DeviceTrait;
use cpal::{Device, SampleFormat, SupportedStreamConfig, SupportedStreamConfigRange};

/// Get a human-readable device name.
///
/// # Returns
/// Device name string, or "Unknown" if the name cannot be retrieved.
pub fn get_device_name(device: &Device) -> String {
    device.description().ok().map(|desc| desc.name().to_string()).unwrap_or_else(|| "Unknown".to_string())
}

/// Find the best matching audio configuration.
///
/// Searches for a configuration that:
/// 1. Supports mono or stereo (max 2 channels)
/// 2. Uses F32 sample format (universally supported on modern hardware)
/// 3. Matches the target sample rate, or uses the closest available rate
pub fn find_best_config(configs: impl Iterator<Item = SupportedStreamConfigRange>, target_sample_rate: u32) -> Result<SupportedStreamConfig> {
    let f32_configs: Vec<SupportedStreamConfigRange> =
        configs.filter(|config| config.channels() <= 2 && config.sample_format() == SampleFormat::F32).collect();

    if f32_configs.is_empty() {
        anyhow::bail!("No F32 audio configuration found - this is unexpected on modern hardware");
    }

    if let Some(config) =
        f32_configs.iter().find(|c| target_sample_rate >= c.min_sample_rate() && target_sample_rate <= c.max_sample_rate())
    {
        return Ok((*config).with_sample_rate(target_sample_rate));
    }

    // Use first config with closest sample rate
    let config = &f32_configs[0];
    let rate = if target_sample_rate < config.min_sample_rate() { config.min_sample_rate() } else { config.max_sample_rate() };
    Ok((*config).with_sample_rate(rate))
}

/// Mix interleaved frames down to mono by averaging channels.
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        data.to_vec()
    } else {
        data.chunks(channels).map(|frame| frame.iter().sum::<f32>() / frame.len() as f32).collect()
    }
}

/// Root-mean-square level of a block of samples.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Encode mono samples as a 16-bit PCM WAV file.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec { channels: 1, sample_rate, bits_per_sample: 16, sample_format: hound::SampleFormat::Int };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(sample_i16).context("Failed to write WAV sample")?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }

    Ok(cursor.into_inner())
}

/// Decode MP3 bytes to mono f32 samples.
///
/// # Returns
/// The samples and their sample rate.
pub fn decode_mp3(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(data));
    let mut samples = Vec::new();
    let mut sample_rate = 0_u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = u32::try_from(frame.sample_rate).unwrap_or(0);
                let pcm: Vec<f32> = frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                samples.extend(downmix_to_mono(&pcm, frame.channels));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => anyhow::bail!("MP3 decode error: {}", e),
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        anyhow::bail!("MP3 data contained no audio frames");
    }

    Ok((samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_to_mono() {
        let data = vec![0.5f32, 1.0, -0.5, -1.0];
        let result = downmix_to_mono(&data, 2);
        assert_eq!(result, vec![0.75, -0.75]);
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0.5, -0.5, 0.5, -0.5]), 0.5);
    }

    #[test]
    fn test_wav_header_and_length() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5, 1.0], 16000).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus 4 samples of 16 bits
        assert_eq!(wav.len(), 44 + 8);

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
    }

    #[test]
    fn test_decode_rejects_non_mp3() {
        assert!(decode_mp3(b"definitely not an mp3 stream").is_err());
        assert!(decode_mp3(&[]).is_err());
    }
}
