//! Model selection for the session.

use std::future::Future;

use tracing::{info, warn};

use super::client::{ChatError, ModelInfo, normalize_model_name};

/// Model used when the catalog cannot be read or has nothing usable.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Generation method a chat model must support.
const GENERATE_CONTENT: &str = "generateContent";

/// A source of available remote models.
pub trait ModelCatalog {
    fn list_models(&self) -> impl Future<Output = Result<Vec<ModelInfo>, ChatError>>;
}

/// Where the session's model name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Given on the command line or in the environment
    Configured,
    /// Picked from the remote catalog
    Discovered,
    /// Hardcoded default after discovery failed or found nothing
    Fallback,
}

/// Pick a model from the catalog.
///
/// The first generate-capable `flash` model wins outright. Failing that the
/// last `gemini-pro` model is taken, then the first generate-capable model.
pub fn select_model(models: &[ModelInfo]) -> Option<&str> {
    let mut pro: Option<&str> = None;

    for model in models.iter().filter(|m| m.supports(GENERATE_CONTENT)) {
        if model.name.contains("flash") {
            return Some(&model.name);
        }
        if model.name.contains("gemini-pro") {
            pro = Some(&model.name);
        }
    }

    pro.or_else(|| models.iter().find(|m| m.supports(GENERATE_CONTENT)).map(|m| m.name.as_str()))
}

/// Resolve the model name for this session.
///
/// A configured name is used as-is. Otherwise the catalog is queried once; any
/// error falls back to [`DEFAULT_MODEL`].
pub async fn resolve_model<C: ModelCatalog>(configured: Option<&str>, catalog: &C) -> (String, ModelSource) {
    if let Some(name) = configured.map(str::trim).filter(|n| !n.is_empty()) {
        info!("Using configured model {}", name);
        return (normalize_model_name(name).to_string(), ModelSource::Configured);
    }

    match catalog.list_models().await {
        Ok(models) => match select_model(&models) {
            Some(name) => {
                info!("Discovered model {} among {} candidates", name, models.len());
                (normalize_model_name(name).to_string(), ModelSource::Discovered)
            }
            None => {
                warn!("No model supporting {} in catalog of {}, falling back to {}", GENERATE_CONTENT, models.len(), DEFAULT_MODEL);
                (DEFAULT_MODEL.to_string(), ModelSource::Fallback)
            }
        },
        Err(e) => {
            warn!("Model discovery failed ({}), falling back to {}", e, DEFAULT_MODEL);
            (DEFAULT_MODEL.to_string(), ModelSource::Fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo { name: name.to_string(), supported_generation_methods: methods.iter().map(|m| m.to_string()).collect() }
    }

    struct StaticCatalog(Result<Vec<ModelInfo>, u16>);

    impl ModelCatalog for StaticCatalog {
        async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatError> {
            match &self.0 {
                Ok(models) => Ok(models.clone()),
                Err(status) => Err(ChatError::Status { status: *status }),
            }
        }
    }

    #[test]
    fn test_flash_preferred_over_earlier_pro() {
        let models = vec![
            model("models/gemini-pro", &["generateContent"]),
            model("models/gemini-1.5-flash", &["generateContent"]),
            model("models/gemini-2.0-flash", &["generateContent"]),
        ];
        assert_eq!(select_model(&models), Some("models/gemini-1.5-flash"));
    }

    #[test]
    fn test_flash_without_generate_content_is_skipped() {
        let models = vec![model("models/gemini-flash-embed", &["embedContent"]), model("models/gemini-pro", &["generateContent"])];
        assert_eq!(select_model(&models), Some("models/gemini-pro"));
    }

    #[test]
    fn test_last_pro_wins_without_flash() {
        let models = vec![
            model("models/gemini-pro", &["generateContent"]),
            model("models/text-bison", &["generateContent"]),
            model("models/gemini-pro-vision", &["generateContent"]),
        ];
        assert_eq!(select_model(&models), Some("models/gemini-pro-vision"));
    }

    #[test]
    fn test_plain_generate_capable_model_is_used() {
        let models = vec![model("models/embedding-001", &["embedContent"]), model("models/chat-bison-001", &["generateContent"])];
        assert_eq!(select_model(&models), Some("models/chat-bison-001"));
    }

    #[test]
    fn test_nothing_usable() {
        assert_eq!(select_model(&[]), None);
        assert_eq!(select_model(&[model("models/embedding-001", &["embedContent"])]), None);
    }

    #[tokio::test]
    async fn test_resolve_plain_model_not_default() {
        let catalog = StaticCatalog(Ok(vec![model("models/chat-bison-001", &["generateContent"])]));
        let (name, source) = resolve_model(None, &catalog).await;
        assert_eq!(name, "chat-bison-001");
        assert_eq!(source, ModelSource::Discovered);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_error() {
        let catalog = StaticCatalog(Err(403));
        assert_eq!(resolve_model(None, &catalog).await, (DEFAULT_MODEL.to_string(), ModelSource::Fallback));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_empty_catalog() {
        let catalog = StaticCatalog(Ok(Vec::new()));
        assert_eq!(resolve_model(None, &catalog).await, (DEFAULT_MODEL.to_string(), ModelSource::Fallback));
    }

    #[tokio::test]
    async fn test_configured_model_skips_discovery() {
        let catalog = StaticCatalog(Err(500));
        let (name, source) = resolve_model(Some("models/gemini-2.5-flash"), &catalog).await;
        assert_eq!(name, "gemini-2.5-flash");
        assert_eq!(source, ModelSource::Configured);
    }
}
