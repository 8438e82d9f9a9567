//! Application configuration and CLI argument parsing.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use super::persona::{DEFAULT_SYSTEM_INSTRUCTION, GenerationSettings, Persona};

/// Default Gemini REST endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Senior assistant configuration.
///
/// Every flag is optional: with `GEMINI_API_KEY` in the environment (or a
/// `.env` file) the assistant runs with the defaults below.
#[derive(Parser, Debug, Clone)]
#[command(name = "senior-assistant")]
#[command(author, version, about = "A patient voice assistant for elderly users", long_about = None)]
pub struct AppConfig {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Google Speech-to-Text API key (defaults to the Gemini key)
    #[arg(long, env = "GOOGLE_SPEECH_API_KEY", hide_env_values = true)]
    pub speech_api_key: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Fixed model name; skips model discovery when set
    #[arg(long, short = 'm', env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// System instruction for the model
    #[arg(long, short = 'p', default_value = DEFAULT_SYSTEM_INSTRUCTION, hide_default_value = true)]
    pub system_prompt: String,

    /// Sampling temperature (0.0-2.0)
    #[arg(long, default_value = "0.4", value_parser = parse_temperature)]
    pub temperature: f32,

    /// Nucleus sampling probability (0.0-1.0)
    #[arg(long, default_value = "0.95", value_parser = parse_probability)]
    pub top_p: f32,

    /// Top-k sampling
    #[arg(long, default_value = "64")]
    pub top_k: u32,

    /// Maximum response length in tokens
    #[arg(long, default_value = "8192")]
    pub max_output_tokens: u32,

    /// Disable spoken answers
    #[arg(long)]
    pub no_voice: bool,

    /// Disable microphone input (text only)
    #[arg(long)]
    pub no_microphone: bool,

    /// Speech recognition language
    #[arg(long, default_value = "pt-BR")]
    pub language: String,

    /// Speech synthesis language
    #[arg(long, default_value = "pt")]
    pub tts_language: String,

    /// Speech synthesis accent (Google top-level domain)
    #[arg(long, default_value = "com.br")]
    pub tts_tld: String,

    /// Microphone sample rate sent to speech recognition
    #[arg(long, default_value = "16000")]
    pub sample_rate: u32,

    /// Seconds spent measuring ambient noise before listening
    #[arg(long, default_value = "1.0")]
    pub calibration: f32,

    /// Seconds to wait for speech to start
    #[arg(long, default_value = "5.0")]
    pub listen_timeout: f32,

    /// Maximum length of one spoken phrase in seconds
    #[arg(long, default_value = "15.0")]
    pub phrase_limit: f32,

    /// Seconds of silence that end a phrase
    #[arg(long, default_value = "0.8")]
    pub pause: f32,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl AppConfig {
    /// Parse configuration from `.env`, the environment and command line arguments.
    pub fn from_args() -> Self {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.gemini_key()?;

        if self.sample_rate == 0 {
            anyhow::bail!("Sample rate must be positive");
        }

        for (name, value) in [
            ("Calibration", self.calibration),
            ("Listen timeout", self.listen_timeout),
            ("Phrase limit", self.phrase_limit),
            ("Pause", self.pause),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{} must be positive, got {}", name, value);
            }
        }

        if self.max_output_tokens == 0 {
            anyhow::bail!("Max output tokens must be positive");
        }

        Ok(())
    }

    /// The Gemini API key, or an error if none was configured.
    pub fn gemini_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => anyhow::bail!("Chave de API não encontrada. Defina GEMINI_API_KEY no ambiente ou no arquivo .env"),
        }
    }

    /// The Speech-to-Text key, falling back to the Gemini key.
    pub fn speech_key(&self) -> Result<&str> {
        match self.speech_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => self.gemini_key(),
        }
    }

    /// Build the persona applied to every request of the session.
    pub fn persona(&self) -> Persona {
        Persona::new(
            self.system_prompt.clone(),
            GenerationSettings {
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: self.top_k,
                max_output_tokens: self.max_output_tokens,
            },
        )
    }

    pub fn calibration_duration(&self) -> Duration {
        Duration::from_secs_f32(self.calibration)
    }

    pub fn listen_timeout_duration(&self) -> Duration {
        Duration::from_secs_f32(self.listen_timeout)
    }

    pub fn phrase_limit_duration(&self) -> Duration {
        Duration::from_secs_f32(self.phrase_limit)
    }

    pub fn pause_duration(&self) -> Duration {
        Duration::from_secs_f32(self.pause)
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        debug!("Configuration:");
        debug!("  API URL: {}", self.api_url);
        debug!("  Model: {}", self.model.as_deref().unwrap_or("(auto)"));
        debug!("  System prompt: {}...", &self.system_prompt.chars().take(50).collect::<String>());
        debug!(
            "  Generation: temperature={} top_p={} top_k={} max_output_tokens={}",
            self.temperature, self.top_p, self.top_k, self.max_output_tokens
        );
        debug!("  Voice output: {}", !self.no_voice);
        debug!("  Microphone: {}", !self.no_microphone);
        debug!("  STT language: {}", self.language);
        debug!("  TTS language: {} ({})", self.tts_language, self.tts_tld);
        debug!("  Listen timeout: {}s, phrase limit: {}s, pause: {}s", self.listen_timeout, self.phrase_limit, self.pause);
    }
}

/// Parse and validate temperature value (0.0-2.0).
fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be between 0.0 and 2.0, got {}", value))
    }
}

/// Parse and validate a probability (0.0-1.0).
fn parse_probability(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid float", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let mut argv = vec!["senior-assistant"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let mut config = parse(&[]);
        config.api_key = None;
        assert!(config.validate().is_err());

        config.api_key = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speech_key_falls_back_to_gemini_key() {
        let mut config = parse(&["--api-key", "gemini-key"]);
        config.speech_api_key = None;
        assert_eq!(config.speech_key().unwrap(), "gemini-key");

        config.speech_api_key = Some("speech-key".to_string());
        assert_eq!(config.speech_key().unwrap(), "speech-key");
    }

    #[test]
    fn test_persona_uses_generation_flags() {
        let config = parse(&["--api-key", "k", "--temperature", "0.9", "--top-k", "10"]);
        let persona = config.persona();
        assert_eq!(persona.generation().temperature, 0.9);
        assert_eq!(persona.generation().top_k, 10);
        assert_eq!(persona.generation().top_p, 0.95);
        assert_eq!(persona.instruction(), DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let result = AppConfig::try_parse_from(["senior-assistant", "--temperature", "3.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        let config = parse(&["--api-key", "k", "--listen-timeout", "0"]);
        assert!(config.validate().is_err());
    }
}
