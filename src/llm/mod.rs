//! LLM module for talking to the Gemini generative-language API.
//!
//! The session owns the conversation history; the client speaks the REST
//! wire format; the resolver picks which model the session uses.

mod client;
mod resolver;
mod session;

pub use client::{GeminiClient, GeminiModels};
pub use resolver::{ModelSource, resolve_model};
pub use session::{ChatBackend, ConversationSession};

#[cfg(test)]
pub(crate) use client::ChatError;
#[cfg(test)]
pub(crate) use session::tests::ScriptedBackend;
