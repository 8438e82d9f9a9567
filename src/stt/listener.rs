//! Microphone listener: capture one phrase and transcribe it.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::detector::{DetectorEvent, DetectorLimits, PhraseDetector, threshold_from_ambient};
use super::{GoogleRecognizer, Listener, SpeechError};
use crate::audio::Capturer;
use crate::render::console;

/// How long to sleep between ring buffer reads.
const READ_INTERVAL: Duration = Duration::from_millis(10);

/// Slack on top of the detector limits before the device is declared dead.
const DEVICE_GRACE: Duration = Duration::from_secs(2);

/// Timing for one listening turn.
#[derive(Debug, Clone, Copy)]
pub struct ListenSettings {
    /// Ambient noise measurement before listening
    pub calibration: Duration,
    /// Wait for speech onset
    pub timeout: Duration,
    /// Maximum phrase length
    pub phrase_limit: Duration,
    /// Silence that ends a phrase
    pub pause: Duration,
}

/// Voice input: microphone capture plus remote recognition.
pub struct VoiceListener {
    capturer: Capturer,
    recognizer: GoogleRecognizer,
    settings: ListenSettings,
}

impl VoiceListener {
    pub fn new(capturer: Capturer, recognizer: GoogleRecognizer, settings: ListenSettings) -> Self {
        Self { capturer, recognizer, settings }
    }

    /// Record one phrase, keeping the microphone open only while listening.
    fn record(&mut self) -> Result<Vec<f32>, SpeechError> {
        self.capturer.start().map_err(|e| SpeechError::Device(e.to_string()))?;
        let result = self.record_phrase();
        self.capturer.pause();
        result
    }

    fn record_phrase(&mut self) -> Result<Vec<f32>, SpeechError> {
        let sample_rate = self.capturer.sample_rate();

        console::dim("Ajustando ruído ambiente... aguarde.");
        let ambient = self.collect_for(self.settings.calibration)?;
        let threshold = threshold_from_ambient(&ambient);
        debug!("Energy threshold {:.4} from {} ambient samples", threshold, ambient.len());

        let limits = DetectorLimits { timeout: self.settings.timeout, phrase_limit: self.settings.phrase_limit, pause: self.settings.pause };
        let mut detector = PhraseDetector::new(sample_rate, threshold, limits);
        let deadline = Instant::now() + limits.timeout + limits.phrase_limit + DEVICE_GRACE;
        let mut buffer = Vec::new();

        console::listening();

        loop {
            self.check_device()?;

            buffer.clear();
            if self.capturer.drain_into(&mut buffer) > 0 {
                match detector.feed(&buffer) {
                    DetectorEvent::TimedOut => return Err(SpeechError::WaitTimeout),
                    DetectorEvent::Complete => break,
                    DetectorEvent::Waiting | DetectorEvent::Speaking => {}
                }
            } else if Instant::now() > deadline {
                return Err(SpeechError::Device("o microfone parou de enviar áudio".to_string()));
            }

            std::thread::sleep(READ_INTERVAL);
        }

        let phrase = detector.into_phrase();
        info!("🎤 Captured phrase ({:.1}s)", phrase.len() as f32 / sample_rate as f32);
        Ok(phrase)
    }

    /// Collect samples for a fixed wall-clock duration.
    fn collect_for(&mut self, duration: Duration) -> Result<Vec<f32>, SpeechError> {
        let until = Instant::now() + duration;
        let mut samples = Vec::new();
        while Instant::now() < until {
            self.check_device()?;
            self.capturer.drain_into(&mut samples);
            std::thread::sleep(READ_INTERVAL);
        }
        Ok(samples)
    }

    fn check_device(&self) -> Result<(), SpeechError> {
        match self.capturer.take_error() {
            Some(e) => Err(SpeechError::Device(e)),
            None => Ok(()),
        }
    }
}

impl Listener for VoiceListener {
    async fn listen(&mut self) -> Result<String, SpeechError> {
        let phrase = self.record()?;

        console::dim("Processando áudio...");
        let text = self.recognizer.recognize(&phrase, self.capturer.sample_rate()).await?;

        info!("🗣️ You: {}", text);
        Ok(text)
    }
}
