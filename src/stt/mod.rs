//! Speech-to-text module.
//!
//! Records one phrase from the microphone with an energy-based endpoint
//! detector and transcribes it with Google Speech-to-Text.

mod detector;
mod listener;
mod recognizer;

use std::future::Future;

pub use listener::{ListenSettings, VoiceListener};
pub use recognizer::GoogleRecognizer;

/// Why a voice turn produced no text.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("Não ouvi nada.")]
    WaitTimeout,

    #[error("Não entendi o que foi dito.")]
    Unrecognized,

    #[error("Erro no microfone: {0}")]
    Device(String),

    #[error("Erro no reconhecimento de voz: {0}")]
    Service(String),
}

impl SpeechError {
    /// Whether the failure was the user's silence or mumbling rather than a fault.
    pub fn is_benign(&self) -> bool {
        matches!(self, SpeechError::WaitTimeout | SpeechError::Unrecognized)
    }
}

/// Something that can capture one spoken utterance and return its text.
pub trait Listener {
    fn listen(&mut self) -> impl Future<Output = Result<String, SpeechError>>;
}
