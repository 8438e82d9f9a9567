//! Text-to-speech synthesizer using Google's translate TTS endpoint.

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Longest text the endpoint accepts in one request.
const MAX_CHUNK_CHARS: usize = 100;

/// Synthesizes MP3 speech one chunk at a time.
pub struct GoogleTts {
    http: reqwest::Client,
    language: String, // Language code, e.g. "pt"
    tld: String,      // Accent selector, e.g. "com.br"
}

impl GoogleTts {
    /// Create a new synthesizer.
    ///
    /// # Arguments
    /// * `language` - Language code (e.g. `pt`)
    /// * `tld` - Google top-level domain selecting the accent (e.g. `com.br`)
    pub fn new(language: &str, tld: &str) -> Self {
        info!("TTS language: {} (translate.google.{})", language, tld);
        Self { http: reqwest::Client::new(), language: language.to_string(), tld: tld.to_string() }
    }

    fn chunk_url(&self, chunk: &str, index: usize, total: usize) -> String {
        format!(
            "https://translate.google.{}/translate_tts?ie=UTF-8&client=tw-ob&tl={}&q={}&total={}&idx={}&textlen={}",
            self.tld,
            urlencoding::encode(&self.language),
            urlencoding::encode(chunk),
            total,
            index,
            chunk.chars().count()
        )
    }

    /// Synthesize `text` into one MP3 stream.
    ///
    /// # Errors
    /// Returns an error if any chunk request fails.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        let total = chunks.len();
        let mut mp3 = Vec::new();

        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Synthesizing chunk {}/{}: \"{}\"", i + 1, total, chunk);

            let response = self
                .http
                .get(self.chunk_url(chunk, i, total))
                .header("User-Agent", "Mozilla/5.0")
                .send()
                .await
                .context("TTS request failed")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("TTS error {}: {}", status, body);
            }

            // MP3 frames from consecutive chunks concatenate into one stream
            mp3.extend_from_slice(&response.bytes().await.context("Failed to read TTS audio")?);
        }

        info!("🎵 Generated speech ({} chunks, {} bytes)", total, mp3.len());
        Ok(mp3)
    }
}

/// Split text into sentences.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        current.push(c);

        // Check for sentence boundaries
        if matches!(c, '.' | '!' | '?' | ';' | ':' | '\n') {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }

    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences are kept whole where possible; longer ones are broken at
/// commas or spaces, and only a single overlong word is cut mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();

    for sentence in split_sentences(text) {
        let mut rest = sentence.as_str();
        while rest.chars().count() > max_chars {
            let limit = rest.char_indices().nth(max_chars).map_or(rest.len(), |(i, _)| i);
            let head = &rest[..limit];
            let cut = head.rfind(", ").map(|i| i + 1).or_else(|| head.rfind(' ')).filter(|&i| i > 0).unwrap_or(limit);

            let piece = rest[..cut].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
            rest = rest[cut..].trim_start();
        }
        if !rest.is_empty() {
            chunks.push(rest.to_string());
        }
    }

    chunks
}
