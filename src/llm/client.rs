//! Gemini REST client: chat completions and the model catalog.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::resolver::ModelCatalog;
use super::session::{ChatBackend, Turn};
use crate::config::{GenerationSettings, Persona};

/// Header carrying the API key (keeps the key out of URLs and error messages).
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Errors returned by the Gemini API.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("falha de rede: {0}")]
    Http(#[from] reqwest::Error),

    #[error("o serviço respondeu com o código {status}")]
    Status { status: u16 },

    #[error("resposta bloqueada ({0})")]
    Blocked(String),

    #[error("resposta vazia do modelo")]
    Empty,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: &'a GenerationSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// One entry of the remote model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

/// Build the request body for one chat turn.
fn build_request<'a>(persona: &'a Persona, history: &'a [Turn], message: &'a str) -> GenerateContentRequest<'a> {
    let mut contents: Vec<Content<'a>> =
        history.iter().map(|turn| Content { role: Some(turn.role.as_str()), parts: vec![Part { text: &turn.text }] }).collect();
    contents.push(Content { role: Some("user"), parts: vec![Part { text: message }] });

    GenerateContentRequest {
        system_instruction: Content { role: None, parts: vec![Part { text: persona.instruction() }] },
        contents,
        generation_config: persona.generation(),
    }
}

/// Extract the reply text from the first candidate.
fn response_text(response: GenerateContentResponse) -> Result<String, ChatError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ChatError::Blocked(reason));
    }

    let candidate = response.candidates.into_iter().next().ok_or(ChatError::Empty)?;
    let text: String = candidate.content.map(|c| c.parts.into_iter().filter_map(|p| p.text).collect()).unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason {
            Some(reason) if reason != "STOP" => Err(ChatError::Blocked(reason)),
            _ => Err(ChatError::Empty),
        };
    }

    Ok(text)
}

/// Strip the `models/` prefix returned by the catalog.
pub fn normalize_model_name(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

/// Turn a non-success response into a `ChatError::Status`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!("Gemini API error {}: {}", status, body);
    Err(ChatError::Status { status: status.as_u16() })
}

/// Chat client bound to one model and persona.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    persona: Persona,
}

impl GeminiClient {
    /// Create a new Gemini chat client.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    /// * `api_key` - Gemini API key
    /// * `model` - Model name, with or without the `models/` prefix
    /// * `persona` - System instruction and generation settings for every request
    pub fn new(base_url: &str, api_key: &str, model: &str, persona: Persona) -> Self {
        let model = normalize_model_name(model).to_string();
        info!("Using model: {}", model);

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model,
            persona,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatBackend for GeminiClient {
    async fn send(&self, history: &[Turn], message: &str) -> Result<String, ChatError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = build_request(&self.persona, history, message);

        debug!("POST {} ({} prior turns)", url, history.len());

        let response = self.http.post(&url).header(API_KEY_HEADER, &self.api_key).json(&request).send().await?;
        let response = check_status(response).await?;
        let body: GenerateContentResponse = response.json().await?;

        response_text(body)
    }
}

/// Model catalog backed by `GET /models`.
pub struct GeminiModels {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiModels {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string(), api_key: api_key.to_string() }
    }
}

impl ModelCatalog for GeminiModels {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!("{}/models?pageSize=100", self.base_url);
            if let Some(ref token) = page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }

            let response = self.http.get(&url).header(API_KEY_HEADER, &self.api_key).send().await?;
            let page: ListModelsResponse = check_status(response).await?.json().await?;

            debug!("Model catalog page: {} models", page.models.len());
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_persona_history_and_message() {
        let persona = Persona::default();
        let history = vec![Turn::user("oi"), Turn::model("Olá!")];
        let request = build_request(&persona, &history, "como faço uma ligação?");
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["systemInstruction"]["parts"][0]["text"], persona.instruction());
        assert!(value["systemInstruction"].get("role").is_none());

        let contents = value["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Olá!");
        assert_eq!(contents[2]["parts"][0]["text"], "como faço uma ligação?");

        assert_eq!(value["generationConfig"]["topK"], 64);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Passo 1. "},{"text":"Toque no ícone."}]},"finishReason":"STOP"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response_text(response).unwrap(), "Passo 1. Toque no ícone.");
    }

    #[test]
    fn test_blocked_prompt_is_an_error() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response_text(response), Err(ChatError::Blocked(reason)) if reason == "SAFETY"));
    }

    #[test]
    fn test_empty_candidate_reports_finish_reason() {
        let body = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response_text(response), Err(ChatError::Blocked(reason)) if reason == "MAX_TOKENS"));

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(response_text(response), Err(ChatError::Empty)));
    }

    #[test]
    fn test_list_models_page_parses() {
        let body = r#"{
            "models": [
                {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]}
            ],
            "nextPageToken": "abc"
        }"#;
        let page: ListModelsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.models.len(), 2);
        assert!(!page.models[0].supports("generateContent"));
        assert!(page.models[1].supports("generateContent"));
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_status_error_message_is_short_portuguese() {
        let message = ChatError::Status { status: 503 }.to_string();
        assert_eq!(message, "o serviço respondeu com o código 503");
        assert!(!message.contains('{'));
    }

    #[test]
    fn test_normalize_model_name() {
        assert_eq!(normalize_model_name("models/gemini-1.5-flash"), "gemini-1.5-flash");
        assert_eq!(normalize_model_name("gemini-2.5-flash"), "gemini-2.5-flash");
    }
}
