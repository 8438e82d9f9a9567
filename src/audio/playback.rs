//! Audio playback module using cpal.
//!
//! Plays mono clips through the default output device and blocks until they finish.
//! Clips are resampled to the device rate and fed to the audio callback through a
//! lock-free ring buffer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::{Condvar, Mutex};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing::{debug, info, warn};

use super::resampler::resample;
use super::util::{find_best_config, get_device_name};

/// Size of the playback ring buffer in samples (~11 seconds at 48kHz)
const PLAYBACK_RING_SIZE: usize = 524288;

/// How often the waiting thread re-checks progress.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra time allowed beyond the clip length before giving up.
const PLAYBACK_GRACE: Duration = Duration::from_secs(2);

/// Audio player that outputs samples to the speaker.
pub struct Player {
    /// Kept alive to maintain the audio stream
    _stream: Stream,
    /// Sample rate of the audio device
    device_sample_rate: u32,
    /// Ring buffer producer feeding the callback
    producer: ringbuf::HeapProd<f32>,
    /// Signalled by the callback when the queue runs dry
    drained: Arc<(Mutex<()>, Condvar)>,
}

impl Player {
    /// Open the default output device.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No output device is available
    /// - Failed to get supported output configurations
    /// - Failed to build output stream
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().context("No output device available")?;

        info!("Using output device: {}", get_device_name(&device));

        // Prefer the device's own rate; clips are resampled to it
        let device_sample_rate = match device.default_output_config() {
            Ok(default_config) => default_config.sample_rate(),
            Err(_) => {
                let supported_configs = device.supported_output_configs().context("Failed to get supported output configs")?;
                find_best_config(supported_configs, 48000)?.sample_rate()
            }
        };

        let supported_configs = device.supported_output_configs().context("Failed to get supported output configs")?;
        let config = find_best_config(supported_configs, device_sample_rate)?;
        let device_sample_rate = config.sample_rate();

        debug!("Audio playback config: {} Hz, {} channels, {:?}", device_sample_rate, config.channels(), config.sample_format());

        let (producer, mut consumer) = HeapRb::<f32>::new(PLAYBACK_RING_SIZE).split();

        let drained = Arc::new((Mutex::new(()), Condvar::new()));
        let drained_clone = drained.clone();

        let channels = config.channels() as usize;
        let stream_config: StreamConfig = config.config();

        let err_fn = |err| {
            tracing::error!("Audio playback error: {}", err);
        };

        let stream = device.build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let had_samples = !consumer.is_empty();

                for frame in data.chunks_mut(channels) {
                    let sample = consumer.try_pop().unwrap_or(0.0);

                    // Duplicate mono sample to all channels
                    for channel in frame.iter_mut() {
                        *channel = sample;
                    }
                }

                if had_samples && consumer.is_empty() {
                    drained_clone.1.notify_all();
                }
            },
            err_fn,
            None,
        )?;

        stream.play().context("Failed to start playback stream")?;

        info!("Audio playback configured at {} Hz", device_sample_rate);

        Ok(Self { _stream: stream, device_sample_rate, producer, drained })
    }

    /// Play a mono clip, blocking until it has been handed to the device.
    ///
    /// # Arguments
    /// * `samples` - Mono f32 samples
    /// * `sample_rate` - Sample rate of `samples`
    ///
    /// # Errors
    /// Returns an error if resampling fails or the device stops consuming audio.
    pub fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let clip = resample(samples, sample_rate, self.device_sample_rate).context("Failed to resample clip for playback")?;

        let clip_duration = Duration::from_secs_f64(clip.len() as f64 / self.device_sample_rate as f64);
        let deadline = Instant::now() + clip_duration + PLAYBACK_GRACE;

        debug!("Playing {} samples at {} Hz ({:.1}s)", clip.len(), self.device_sample_rate, clip_duration.as_secs_f32());

        let mut offset = 0;
        loop {
            // Top up the ring buffer; long clips are fed as space frees up
            if offset < clip.len() {
                offset += self.producer.push_slice(&clip[offset..]);
            }

            if offset >= clip.len() && self.producer.is_empty() {
                break;
            }

            if Instant::now() > deadline {
                warn!("Playback timeout exceeded");
                anyhow::bail!("audio device stopped consuming samples");
            }

            let (lock, condvar) = &*self.drained;
            let mut guard = lock.lock();
            condvar.wait_for(&mut guard, POLL_INTERVAL);
        }

        // Let the device play out its last callback buffer
        std::thread::sleep(POLL_INTERVAL);

        debug!("Playback completed");
        Ok(())
    }
}
