//! Spoken output: synthesize, stage the clip in a temp file, play, clean up.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::{GoogleTts, SpeechOutput};
use crate::audio::Player;
use crate::audio::util::decode_mp3;

/// Synthesizer plus output device, owned for the whole session.
pub struct Speaker {
    synthesizer: GoogleTts,
    player: Player,
}

impl Speaker {
    pub fn new(synthesizer: GoogleTts, player: Player) -> Self {
        Self { synthesizer, player }
    }

    fn play_clip(&mut self, mp3: &[u8]) -> Result<()> {
        with_staged_clip(mp3, |path| {
            let data = std::fs::read(path).context("Failed to read temp audio file")?;
            let (samples, sample_rate) = decode_mp3(&data)?;
            self.player.play(&samples, sample_rate)
        })
    }
}

/// Write an MP3 clip to a temporary file and hand its path to `play`.
///
/// The file is removed afterwards whatever `play` returns; a failed removal
/// is only logged.
fn with_staged_clip<T>(mp3: &[u8], play: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let mut file = tempfile::Builder::new().prefix("assistente-").suffix(".mp3").tempfile().context("Failed to create temp audio file")?;
    file.write_all(mp3).context("Failed to write temp audio file")?;
    file.flush().context("Failed to write temp audio file")?;

    let path = file.into_temp_path();
    debug!("Speech clip staged at {}", path.display());

    let result = play(&path);

    if let Err(e) = path.close() {
        debug!("Could not remove temp audio file: {}", e);
    }

    result
}

impl SpeechOutput for Speaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let mp3 = self.synthesizer.synthesize(text).await?;
        self.play_clip(&mp3)
    }
}
