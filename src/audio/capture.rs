//! Audio capture module using cpal.
//!
//! Captures audio from the default input device into a lock-free ring buffer.
//! Includes automatic resampling when the device sample rate differs from the target.
//! The capture only records while started, so the microphone is idle between turns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing::{debug, info, warn};

use super::resampler::StreamResampler;
use super::util::{downmix_to_mono, find_best_config, get_device_name};

/// Ring buffer size in samples (~32 seconds at 16kHz, longer than any phrase).
const CAPTURE_RING_SIZE: usize = 524288;

/// Microphone input at a fixed output sample rate.
pub struct Capturer {
    stream: Stream,                         // cpal audio stream (kept alive)
    consumer: ringbuf::HeapCons<f32>,       // Ring buffer consumer
    running: Arc<AtomicBool>,               // Whether the callback keeps samples
    last_error: Arc<Mutex<Option<String>>>, // Device error reported by the stream
    sample_rate: u32,                       // Output sample rate
}

impl Capturer {
    /// Open the default input device.
    ///
    /// # Arguments
    /// * `sample_rate` - The desired output sample rate (typically 16000 for STT)
    ///
    /// # Errors
    /// Returns an error if:
    /// - No input device is available
    /// - Failed to get supported input configurations
    /// - Failed to build input stream
    pub fn new(sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device().context("No input device available")?;

        info!("Using input device: {}", get_device_name(&device));

        let supported_configs = device.supported_input_configs().context("Failed to get supported input configs")?;
        let config = find_best_config(supported_configs, sample_rate)?;
        let device_sample_rate = config.sample_rate();

        let mut resampler = if device_sample_rate != sample_rate {
            info!("Device sample rate {} Hz differs from target {} Hz - resampling will be applied", device_sample_rate, sample_rate);
            Some(StreamResampler::new(device_sample_rate, sample_rate)?)
        } else {
            None
        };

        debug!("Audio capture config: {} Hz, {} channels, {:?}", device_sample_rate, config.channels(), config.sample_format());

        let running = Arc::new(AtomicBool::new(false));
        let last_error = Arc::new(Mutex::new(None));
        let running_clone = running.clone();
        let error_clone = last_error.clone();
        let channels = config.channels() as usize;
        let stream_config: StreamConfig = config.config();

        let (mut producer, consumer) = HeapRb::<f32>::new(CAPTURE_RING_SIZE).split();

        let err_fn = move |err: cpal::StreamError| {
            tracing::error!("Audio capture error: {}", err);
            *error_clone.lock() = Some(err.to_string());
        };

        // Build F32 input stream (guaranteed by find_best_config)
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if !running_clone.load(Ordering::Relaxed) {
                    return;
                }

                let mono = downmix_to_mono(data, channels);
                let samples = match resampler.as_mut() {
                    Some(resampler) => match resampler.push(&mono) {
                        Ok(samples) => samples,
                        Err(e) => {
                            tracing::error!("Capture resampling failed: {}", e);
                            return;
                        }
                    },
                    None => mono,
                };

                let written = producer.push_slice(&samples);
                if written < samples.len() {
                    tracing::warn!("Capture buffer full, dropped {} samples", samples.len() - written);
                }
            },
            err_fn,
            None,
        )?;

        info!("Audio capture configured: device {} Hz -> output {} Hz", device_sample_rate, sample_rate);

        Ok(Self { stream, consumer, running, last_error, sample_rate })
    }

    /// Start recording, discarding anything left from a previous turn.
    pub fn start(&mut self) -> Result<()> {
        self.clear();
        *self.last_error.lock() = None;
        self.running.store(true, Ordering::SeqCst);
        self.stream.play().context("Failed to start audio stream")?;
        debug!("Audio capture started");
        Ok(())
    }

    /// Stop recording. The stream stays open for the next turn.
    pub fn pause(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause audio stream: {}", e);
        }
        debug!("Audio capture paused");
    }

    /// Move all buffered samples into `out`, returning how many were read.
    pub fn drain_into(&mut self, out: &mut Vec<f32>) -> usize {
        let available = self.consumer.occupied_len();
        if available == 0 {
            return 0;
        }
        let start = out.len();
        out.resize(start + available, 0.0);
        let read = self.consumer.pop_slice(&mut out[start..]);
        out.truncate(start + read);
        read
    }

    /// Drop any buffered samples.
    pub fn clear(&mut self) {
        let dropped = self.consumer.skip(self.consumer.occupied_len());
        if dropped > 0 {
            debug!("Discarded {} stale capture samples", dropped);
        }
    }

    /// Take the last device error reported by the stream, if any.
    pub fn take_error(&self) -> Option<String> {
        self.last_error.lock().take()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for Capturer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.stream.pause();
    }
}
