//! Chooses between microphone and keyboard for every turn.

use tracing::{debug, warn};

use super::Prompter;
use crate::render::console;
use crate::stt::Listener;

const CHOICE_PROMPT: &str = "Escolha: [1] Falar no Microfone  [2] Digitar (Enter para falar): ";
const TEXT_PROMPT: &str = "Digite sua dúvida: ";

/// Words that end the conversation, compared after normalization.
const TERMINATION_PHRASES: [&str; 5] = ["sair", "tchau", "encerrar", "desligar", "#sair"];

/// What the user did on one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Utterance(String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputState {
    AwaitingChoice,
    Listening,
    ReadingText,
    Terminated,
}

/// Whether `text` asks to end the session.
///
/// Case and surrounding whitespace are ignored, as is trailing `.`, `!` or
/// `?` punctuation that recognizers like to append.
pub fn is_termination_phrase(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches(['.', '!', '?']).trim_end().to_lowercase();
    TERMINATION_PHRASES.contains(&normalized.as_str())
}

/// Produces one [`InputEvent`] per call from voice or keyboard.
///
/// Without a listener the multiplexer never asks for a choice and reads text
/// directly. Once a termination phrase is seen it stays terminated.
pub struct InputMultiplexer<P, L> {
    prompter: P,
    listener: Option<L>,
    state: InputState,
}

impl<P: Prompter, L: Listener> InputMultiplexer<P, L> {
    pub fn new(prompter: P, listener: Option<L>) -> Self {
        let state = if listener.is_some() { InputState::AwaitingChoice } else { InputState::ReadingText };
        Self { prompter, listener, state }
    }

    /// Whether turns can be spoken rather than typed.
    pub fn has_voice(&self) -> bool {
        self.listener.is_some()
    }

    #[cfg(test)]
    fn state(&self) -> InputState {
        self.state
    }

    fn turn_start(&self) -> InputState {
        if self.listener.is_some() { InputState::AwaitingChoice } else { InputState::ReadingText }
    }

    /// Wait for the next non-empty utterance or a request to quit.
    pub async fn next_event(&mut self) -> InputEvent {
        loop {
            match self.state {
                InputState::Terminated => return InputEvent::Quit,

                InputState::AwaitingChoice => {
                    let Some(answer) = self.prompter.read_line(CHOICE_PROMPT) else {
                        return self.terminate();
                    };
                    let answer = answer.trim();
                    self.state = if answer.is_empty() || answer == "1" { InputState::Listening } else { InputState::ReadingText };
                }

                InputState::Listening => {
                    let Some(listener) = self.listener.as_mut() else {
                        self.state = InputState::ReadingText;
                        continue;
                    };

                    match listener.listen().await {
                        Ok(text) if text.trim().is_empty() => {
                            debug!("Listener returned blank text");
                            console::dim("Por favor, digite sua dúvida.");
                            self.state = InputState::ReadingText;
                        }
                        Ok(text) => {
                            self.state = self.turn_start();
                            console::user_said(text.trim());
                            if let Some(event) = self.accept(&text) {
                                return event;
                            }
                        }
                        Err(e) => {
                            if e.is_benign() {
                                debug!("No voice input: {}", e);
                                console::warn(&e.to_string());
                            } else {
                                warn!("Voice input failed: {}", e);
                                console::error(&e.to_string());
                            }
                            console::dim("Por favor, digite sua dúvida.");
                            self.state = InputState::ReadingText;
                        }
                    }
                }

                InputState::ReadingText => {
                    let Some(line) = self.prompter.read_line(TEXT_PROMPT) else {
                        return self.terminate();
                    };
                    self.state = self.turn_start();
                    if let Some(event) = self.accept(&line) {
                        return event;
                    }
                }
            }
        }
    }

    fn accept(&mut self, text: &str) -> Option<InputEvent> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty input");
            return None;
        }
        if is_termination_phrase(text) {
            return Some(self.terminate());
        }
        Some(InputEvent::Utterance(text.to_string()))
    }

    fn terminate(&mut self) -> InputEvent {
        self.state = InputState::Terminated;
        InputEvent::Quit
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::stt::SpeechError;

    /// Replays scripted lines; runs dry as end of input.
    #[derive(Default)]
    pub(crate) struct ScriptedPrompter {
        lines: VecDeque<String>,
        pub prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        pub(crate) fn new(lines: &[&str]) -> Self {
            Self { lines: lines.iter().map(|s| s.to_string()).collect(), prompts: Vec::new() }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn read_line(&mut self, prompt: &str) -> Option<String> {
            self.prompts.push(prompt.to_string());
            self.lines.pop_front()
        }
    }

    /// Replays scripted recognition results.
    pub(crate) struct ScriptedListener {
        results: VecDeque<Result<String, SpeechError>>,
    }

    impl ScriptedListener {
        pub(crate) fn new(results: Vec<Result<String, SpeechError>>) -> Self {
            Self { results: results.into() }
        }
    }

    impl Listener for ScriptedListener {
        async fn listen(&mut self) -> Result<String, SpeechError> {
            self.results.pop_front().unwrap_or(Err(SpeechError::WaitTimeout))
        }
    }

    fn text_only(lines: &[&str]) -> InputMultiplexer<ScriptedPrompter, ScriptedListener> {
        InputMultiplexer::new(ScriptedPrompter::new(lines), None)
    }

    #[test]
    fn test_termination_phrases() {
        for phrase in ["sair", "Sair", "  TCHAU ", "encerrar.", "Desligar!", "#sair", "tchau?!"] {
            assert!(is_termination_phrase(phrase), "{:?} should end the session", phrase);
        }
        for phrase in ["sair de casa", "não quero sair", "tchau tchau", "", "sai"] {
            assert!(!is_termination_phrase(phrase), "{:?} should not end the session", phrase);
        }
    }

    #[tokio::test]
    async fn test_text_only_never_offers_choice() {
        let mut input = text_only(&["Como ligo o Wi-Fi?"]);
        assert_eq!(input.state(), InputState::ReadingText);
        assert_eq!(input.next_event().await, InputEvent::Utterance("Como ligo o Wi-Fi?".into()));
        assert!(input.prompter.prompts.iter().all(|p| p == TEXT_PROMPT));
    }

    #[tokio::test]
    async fn test_whitespace_is_reprompted() {
        let mut input = text_only(&["   ", "", "\t", "Olá"]);
        assert_eq!(input.next_event().await, InputEvent::Utterance("Olá".into()));
        assert_eq!(input.prompter.prompts.len(), 4);
    }

    #[tokio::test]
    async fn test_quit_is_sticky() {
        let mut input = text_only(&["Sair.", "isso nunca é lido"]);
        assert_eq!(input.next_event().await, InputEvent::Quit);
        assert_eq!(input.state(), InputState::Terminated);
        assert_eq!(input.next_event().await, InputEvent::Quit);
        assert_eq!(input.prompter.prompts.len(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_quits() {
        let mut input = text_only(&[]);
        assert_eq!(input.next_event().await, InputEvent::Quit);
        assert_eq!(input.state(), InputState::Terminated);
    }

    #[tokio::test]
    async fn test_voice_choice_listens() {
        let listener = ScriptedListener::new(vec![Ok("como mando foto".into()), Ok("tchau".into())]);
        let mut input = InputMultiplexer::new(ScriptedPrompter::new(&["", "1"]), Some(listener));

        assert_eq!(input.next_event().await, InputEvent::Utterance("como mando foto".into()));
        assert_eq!(input.state(), InputState::AwaitingChoice);
        assert_eq!(input.next_event().await, InputEvent::Quit);
    }

    #[tokio::test]
    async fn test_typing_choice_reads_text() {
        let listener = ScriptedListener::new(vec![]);
        let mut input = InputMultiplexer::new(ScriptedPrompter::new(&["2", "Quanto é 2 + 2?"]), Some(listener));

        assert_eq!(input.next_event().await, InputEvent::Utterance("Quanto é 2 + 2?".into()));
        assert_eq!(input.prompter.prompts, vec![CHOICE_PROMPT.to_string(), TEXT_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn test_blank_transcript_goes_to_text_entry() {
        let listener = ScriptedListener::new(vec![Ok("   ".into())]);
        let mut input = InputMultiplexer::new(ScriptedPrompter::new(&["1", "digitado"]), Some(listener));

        assert_eq!(input.next_event().await, InputEvent::Utterance("digitado".into()));
        assert_eq!(input.prompter.prompts, vec![CHOICE_PROMPT.to_string(), TEXT_PROMPT.to_string()]);
    }

    #[tokio::test]
    async fn test_voice_failure_falls_back_to_text() {
        let listener = ScriptedListener::new(vec![
            Err(SpeechError::Unrecognized),
            Err(SpeechError::Device("sem microfone".into())),
        ]);
        let mut input = InputMultiplexer::new(ScriptedPrompter::new(&["1", "primeira", "1", "segunda"]), Some(listener));

        assert_eq!(input.next_event().await, InputEvent::Utterance("primeira".into()));
        assert_eq!(input.next_event().await, InputEvent::Utterance("segunda".into()));
    }
}
