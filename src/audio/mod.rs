//! Microphone and speaker access.
//!
//! Capture records one phrase at a time at the recognizer's sample rate;
//! playback plays decoded speech clips to completion. Both sit on cpal with
//! rubato handling rate conversion, and `util` holds the WAV/MP3 helpers.

mod capture;
mod playback;
pub mod resampler;
pub mod util;

pub use capture::Capturer;
pub use playback::Player;
