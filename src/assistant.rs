//! The conversation loop: input, model, output, until the user leaves.

use tracing::{debug, error, info};

use crate::input::{InputEvent, InputMultiplexer, Prompter};
use crate::llm::{ChatBackend, ConversationSession};
use crate::render::{Renderer, console};
use crate::stt::Listener;
use crate::tts::SpeechOutput;

const GREETING: &str = "Olá! Sou seu assistente virtual. Como posso ajudar hoje?";
const FAREWELL: &str = "Foi um prazer ajudar! Até logo.";
const APOLOGY: &str = "Desculpe, a conexão com o assistente falhou. Por favor, tente novamente mais tarde.";

/// Outcome of one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Successful request/response pairs
    pub exchanges: usize,
    /// Utterances the model could not answer
    pub failures: usize,
}

/// Run the conversation until the user quits or input closes.
///
/// Chat and speech failures are reported and the loop carries on; only a
/// termination phrase or end of input stops it.
pub async fn run<P, L, B, S>(input: &mut InputMultiplexer<P, L>, session: &mut ConversationSession<B>, renderer: &mut Renderer<S>) -> SessionSummary
where
    P: Prompter,
    L: Listener,
    B: ChatBackend,
    S: SpeechOutput,
{
    console::welcome();
    renderer.announce(GREETING).await;

    let mut failures = 0;

    loop {
        let utterance = match input.next_event().await {
            InputEvent::Quit => break,
            InputEvent::Utterance(text) => text,
        };

        console::thinking();

        match session.submit(&utterance).await {
            Ok(reply) => {
                debug!("History holds {} turns", session.history().len());
                renderer.respond(&reply).await;
            }
            Err(e) => {
                failures += 1;
                error!("❌ Chat error: {}", e);
                console::error(&format!("Erro de conexão: {}", e));
                renderer.say(APOLOGY).await;
            }
        }
    }

    renderer.announce(FAREWELL).await;

    let summary = SessionSummary { exchanges: session.exchanges(), failures };
    info!("Session finished: {} exchanges, {} failures", summary.exchanges, summary.failures);
    summary
}
