//! Speech recognizer backed by Google Cloud Speech-to-Text.

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::SpeechError;
use crate::audio::util::samples_to_wav;

/// Synchronous recognition endpoint (phrases up to one minute).
const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Recordings shorter than this are not worth a request.
const MIN_PHRASE_SECONDS: f32 = 0.1;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

/// Join the best alternative of every result into one transcript.
fn transcript(response: RecognizeResponse) -> Option<String> {
    let text = response
        .results
        .into_iter()
        .filter_map(|r| r.alternatives.into_iter().next())
        .map(|a| a.transcript.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() { None } else { Some(text) }
}

/// Client for the Speech-to-Text `recognize` method.
pub struct GoogleRecognizer {
    http: reqwest::Client,
    api_key: String,
    language: String,
}

impl GoogleRecognizer {
    /// Create a new recognizer.
    ///
    /// # Arguments
    /// * `api_key` - Google Cloud API key with Speech-to-Text enabled
    /// * `language` - BCP-47 language code, e.g. `pt-BR`
    pub fn new(api_key: &str, language: &str) -> Self {
        info!("Speech recognition language: {}", language);
        Self { http: reqwest::Client::new(), api_key: api_key.to_string(), language: language.to_string() }
    }

    /// Transcribe one recorded phrase.
    ///
    /// # Errors
    /// `Unrecognized` when the service returns no transcript, `Service` for
    /// network or API failures.
    pub async fn recognize(&self, samples: &[f32], sample_rate: u32) -> Result<String, SpeechError> {
        if (samples.len() as f32) < MIN_PHRASE_SECONDS * sample_rate as f32 {
            debug!("Phrase too short to recognize ({} samples)", samples.len());
            return Err(SpeechError::Unrecognized);
        }

        let wav = samples_to_wav(samples, sample_rate).map_err(|e| SpeechError::Service(e.to_string()))?;
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: sample_rate,
                language_code: &self.language,
                enable_automatic_punctuation: false,
            },
            audio: RecognitionAudio { content: base64::engine::general_purpose::STANDARD.encode(&wav) },
        };

        debug!("Sending {} bytes of audio for recognition", wav.len());

        let response = self
            .http
            .post(RECOGNIZE_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Service(format!("Speech API error {}: {}", status, body)));
        }

        let body: RecognizeResponse = response.json().await.map_err(|e| SpeechError::Service(e.to_string()))?;
        transcript(body).ok_or(SpeechError::Unrecognized)
    }
}
