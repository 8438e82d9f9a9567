//! Senior Assistant - a patient voice and text assistant for older adults.
//!
//! Questions are spoken into the microphone (Google Speech-to-Text) or typed,
//! answered by a Gemini model with a simple-language persona, and shown on
//! screen as well as read aloud (Google TTS).

mod assistant;
mod audio;
mod config;
mod input;
mod llm;
mod render;
mod stt;
mod tts;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use audio::{Capturer, Player};
use config::AppConfig;
use input::{ConsolePrompter, InputMultiplexer};
use llm::{ConversationSession, GeminiClient, GeminiModels, ModelSource, resolve_model};
use render::{Renderer, console};
use stt::{GoogleRecognizer, ListenSettings, VoiceListener};
use tts::{GoogleTts, Speaker};

/// Open the microphone, or `None` when voice input is disabled or unavailable.
fn voice_listener(config: &AppConfig) -> Result<Option<VoiceListener>> {
    if config.no_microphone {
        info!("Microphone disabled by configuration");
        return Ok(None);
    }

    let capturer = match Capturer::new(config.sample_rate) {
        Ok(capturer) => capturer,
        Err(e) => {
            warn!("Microphone unavailable: {:#}", e);
            console::warn("Microfone não encontrado. Use o teclado para digitar suas dúvidas.");
            return Ok(None);
        }
    };

    let recognizer = GoogleRecognizer::new(config.speech_key()?, &config.language);
    let settings = ListenSettings {
        calibration: config.calibration_duration(),
        timeout: config.listen_timeout_duration(),
        phrase_limit: config.phrase_limit_duration(),
        pause: config.pause_duration(),
    };

    Ok(Some(VoiceListener::new(capturer, recognizer, settings)))
}

/// Open the speakers, or `None` when speech output is disabled or unavailable.
fn speaker(config: &AppConfig) -> Option<Speaker> {
    if config.no_voice {
        info!("Speech output disabled by configuration");
        return None;
    }

    match Player::new() {
        Ok(player) => Some(Speaker::new(GoogleTts::new(&config.tts_language, &config.tts_tld), player)),
        Err(e) => {
            warn!("Audio output unavailable: {:#}", e);
            console::warn("Saída de áudio indisponível. As respostas serão apenas exibidas.");
            None
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to warn
    // so the conversation is not buried in log lines
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("warn") })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("🎤 Senior Assistant v{}", env!("CARGO_PKG_VERSION"));

    let api_key = match config.gemini_key() {
        Ok(key) => key,
        Err(e) => {
            error!("❌ {}", e);
            console::critical("ERRO CRÍTICO: Chave de API não encontrada.");
            console::dim("Defina GEMINI_API_KEY no ambiente ou no arquivo .env.");
            console::wait_for_enter("Pressione Enter para sair...");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        console::critical(&format!("Erro de configuração: {}", e));
        std::process::exit(1);
    }
    config.log_config();

    console::dim("Conectando ao Google para verificar modelos...");
    let catalog = GeminiModels::new(&config.api_url, api_key);
    let (model, source) = resolve_model(config.model.as_deref(), &catalog).await;
    if source == ModelSource::Fallback {
        console::warn("Não foi possível listar os modelos; usando o modelo padrão.");
    }

    let client = GeminiClient::new(&config.api_url, api_key, &model, config.persona());
    console::success(&format!("Modelo selecionado: {}", client.model()));

    let listener = voice_listener(&config)?;
    let prompter = ConsolePrompter::new()?;

    let mut input = InputMultiplexer::new(prompter, listener);
    let mut session = ConversationSession::new(client);
    let mut renderer = Renderer::new(speaker(&config));

    info!("Starting assistant (voice input: {}, speech output: {})", input.has_voice(), renderer.speaks());

    let summary = assistant::run(&mut input, &mut session, &mut renderer).await;

    info!("✅ Assistant stopped after {} exchanges ({} failed)", summary.exchanges, summary.failures);
    Ok(())
}
