//! Energy-based phrase endpointing.
//!
//! Audio is cut into 30ms frames. A frame louder than the threshold starts (or
//! continues) the phrase; a run of quiet frames as long as the pause ends it.

use std::collections::VecDeque;
use std::time::Duration;

use crate::audio::util::rms;

/// Frame length used for energy measurement.
const FRAME_DURATION: Duration = Duration::from_millis(30);

/// Audio kept from before speech onset so the first syllable is not clipped.
const PRE_ROLL: Duration = Duration::from_millis(300);

/// Lowest usable threshold (300 on the 16-bit scale).
pub const MIN_ENERGY_THRESHOLD: f32 = 300.0 / 32768.0;

/// Multiplier applied to the ambient level to get the speech threshold.
const AMBIENT_RATIO: f32 = 1.5;

/// Derive the speech threshold from a sample of background noise.
pub fn threshold_from_ambient(ambient: &[f32]) -> f32 {
    (rms(ambient) * AMBIENT_RATIO).max(MIN_ENERGY_THRESHOLD)
}

fn frames_in(duration: Duration, frame_len: usize, sample_rate: u32) -> usize {
    let samples = duration.as_secs_f64() * f64::from(sample_rate);
    ((samples / frame_len as f64).ceil() as usize).max(1)
}

/// Progress of the detector after feeding audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorEvent {
    /// No speech yet
    Waiting,
    /// Speech is being recorded
    Speaking,
    /// The phrase ended (pause or length cap)
    Complete,
    /// Nobody spoke before the timeout
    TimedOut,
}

/// Timing limits for one phrase.
#[derive(Debug, Clone, Copy)]
pub struct DetectorLimits {
    pub timeout: Duration,
    pub phrase_limit: Duration,
    pub pause: Duration,
}

pub struct PhraseDetector {
    frame_len: usize,
    threshold: f32,
    timeout_frames: usize,
    limit_frames: usize,
    pause_frames: usize,
    pre_roll_frames: usize,
    pending: Vec<f32>,
    pre_roll: VecDeque<Vec<f32>>,
    phrase: Vec<f32>,
    waited_frames: usize,
    phrase_frames: usize,
    quiet_frames: usize,
    state: DetectorEvent,
}

impl PhraseDetector {
    pub fn new(sample_rate: u32, threshold: f32, limits: DetectorLimits) -> Self {
        let frame_len = ((FRAME_DURATION.as_secs_f64() * f64::from(sample_rate)) as usize).max(1);

        Self {
            frame_len,
            threshold,
            timeout_frames: frames_in(limits.timeout, frame_len, sample_rate),
            limit_frames: frames_in(limits.phrase_limit, frame_len, sample_rate),
            pause_frames: frames_in(limits.pause, frame_len, sample_rate),
            pre_roll_frames: frames_in(PRE_ROLL, frame_len, sample_rate),
            pending: Vec::new(),
            pre_roll: VecDeque::new(),
            phrase: Vec::new(),
            waited_frames: 0,
            phrase_frames: 0,
            quiet_frames: 0,
            state: DetectorEvent::Waiting,
        }
    }

    /// Feed captured samples. Once `Complete` or `TimedOut` is returned further
    /// input is ignored.
    pub fn feed(&mut self, samples: &[f32]) -> DetectorEvent {
        if self.is_finished() {
            return self.state;
        }

        self.pending.extend_from_slice(samples);

        let mut consumed = 0;
        while self.pending.len() - consumed >= self.frame_len && !self.is_finished() {
            let frame = self.pending[consumed..consumed + self.frame_len].to_vec();
            consumed += self.frame_len;
            self.process_frame(frame);
        }
        self.pending.drain(..consumed);

        self.state
    }

    fn process_frame(&mut self, frame: Vec<f32>) {
        let loud = rms(&frame) > self.threshold;

        match self.state {
            DetectorEvent::Waiting => {
                if loud {
                    self.phrase.extend(self.pre_roll.drain(..).flatten());
                    self.phrase.extend_from_slice(&frame);
                    self.phrase_frames = 1;
                    self.state = DetectorEvent::Speaking;
                } else {
                    self.waited_frames += 1;
                    self.pre_roll.push_back(frame);
                    if self.pre_roll.len() > self.pre_roll_frames {
                        self.pre_roll.pop_front();
                    }
                    if self.waited_frames >= self.timeout_frames {
                        self.state = DetectorEvent::TimedOut;
                    }
                }
            }
            DetectorEvent::Speaking => {
                self.phrase.extend_from_slice(&frame);
                self.phrase_frames += 1;
                self.quiet_frames = if loud { 0 } else { self.quiet_frames + 1 };

                if self.quiet_frames >= self.pause_frames || self.phrase_frames >= self.limit_frames {
                    self.state = DetectorEvent::Complete;
                }
            }
            DetectorEvent::Complete | DetectorEvent::TimedOut => {}
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, DetectorEvent::Complete | DetectorEvent::TimedOut)
    }

    /// The recorded phrase, including pre-roll and trailing pause.
    pub fn into_phrase(self) -> Vec<f32> {
        self.phrase
    }
}
