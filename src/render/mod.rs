//! Output rendering: what the user reads and, optionally, hears.

pub mod console;
mod markdown;

use tracing::{info, warn};

pub use markdown::{format_for_console, strip_markdown};

use crate::tts::SpeechOutput;

/// Presents assistant text on the console and through speech when available.
pub struct Renderer<S> {
    speech: Option<S>,
}

impl<S: SpeechOutput> Renderer<S> {
    /// Create a renderer; `None` means text-only output.
    pub fn new(speech: Option<S>) -> Self {
        Self { speech }
    }

    pub fn speaks(&self) -> bool {
        self.speech.is_some()
    }

    /// Show a model reply and read it aloud.
    pub async fn respond(&mut self, text: &str) {
        info!("🤖 Assistant: {}", text);
        console::assistant_reply(&format_for_console(text));
        self.say(text).await;
    }

    /// Speak a message without printing it.
    ///
    /// Speech failures are reported to the user and never abort the session.
    pub async fn say(&mut self, text: &str) {
        let Some(speech) = self.speech.as_mut() else {
            return;
        };

        let clean = strip_markdown(text);
        if let Err(e) = speech.speak(&clean).await {
            warn!("Speech output failed: {:#}", e);
            console::error(&format!("Erro ao tentar falar: {}", e));
        }
    }

    /// Print a status line and speak it too.
    pub async fn announce(&mut self, text: &str) {
        console::success(text);
        self.say(text).await;
    }
}
