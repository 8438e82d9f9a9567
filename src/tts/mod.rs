//! Text-to-speech module.
//!
//! Provides speech synthesis through Google's translate TTS endpoint and
//! blocking playback of the resulting clips.

mod speaker;
mod synthesizer;

use std::future::Future;

pub use speaker::Speaker;
pub use synthesizer::GoogleTts;

/// Something that can say a piece of plain text out loud.
pub trait SpeechOutput {
    /// Speak `text`, returning once playback has finished.
    fn speak(&mut self, text: &str) -> impl Future<Output = anyhow::Result<()>>;
}
