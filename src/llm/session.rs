//! Conversation session holding the ordered chat history.

use std::future::Future;

use tracing::debug;

use super::client::ChatError;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// A remote chat model, already configured with its persona.
pub trait ChatBackend {
    /// Send `message` after `history` and return the model's reply.
    fn send(&self, history: &[Turn], message: &str) -> impl Future<Output = Result<String, ChatError>>;
}

/// Conversation with a single remote model.
///
/// History is append-only and only grows on successful exchanges, so a failed
/// request can simply be retried by the user on the next turn.
pub struct ConversationSession<B> {
    backend: B,
    history: Vec<Turn>,
}

impl<B: ChatBackend> ConversationSession<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, history: Vec::new() }
    }

    /// Send an utterance and return the reply, recording both in the history.
    ///
    /// # Errors
    /// Returns the backend error unchanged; the history is left untouched.
    pub async fn submit(&mut self, utterance: &str) -> Result<String, ChatError> {
        debug!("User: {}", utterance);

        let reply = self.backend.send(&self.history, utterance).await?;

        debug!("Assistant: {}", reply);

        self.history.push(Turn::user(utterance));
        self.history.push(Turn::model(&reply));

        Ok(reply)
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of completed request/response pairs.
    pub fn exchanges(&self) -> usize {
        self.history.len() / 2
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Backend that replays scripted replies and records what it was sent.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        pub replies: Mutex<VecDeque<Result<String, ChatError>>>,
        pub calls: Mutex<Vec<(usize, String)>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(replies: Vec<Result<String, ChatError>>) -> Self {
            Self { replies: Mutex::new(replies.into()), calls: Mutex::new(Vec::new()) }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn send(&self, history: &[Turn], message: &str) -> Result<String, ChatError> {
            self.calls.lock().push((history.len(), message.to_string()));
            self.replies.lock().pop_front().unwrap_or_else(|| Ok(format!("eco: {}", message)))
        }
    }

    #[tokio::test]
    async fn test_history_grows_by_one_pair_per_exchange() {
        let mut session = ConversationSession::new(ScriptedBackend::default());

        for (i, message) in ["oi", "como ligo o wifi?", "obrigado"].iter().enumerate() {
            let reply = session.submit(message).await.unwrap();
            assert_eq!(reply, format!("eco: {}", message));
            assert_eq!(session.history().len(), (i + 1) * 2);
        }

        assert_eq!(session.exchanges(), 3);
        assert_eq!(session.history()[0], Turn::user("oi"));
        assert_eq!(session.history()[1], Turn::model("eco: oi"));
        assert_eq!(session.history()[4], Turn::user("obrigado"));
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_history_unchanged() {
        let backend = ScriptedBackend::new(vec![
            Ok("primeira".to_string()),
            Err(ChatError::Status { status: 503 }),
        ]);
        let mut session = ConversationSession::new(backend);

        session.submit("um").await.unwrap();
        let before = session.history().to_vec();

        assert!(session.submit("dois").await.is_err());
        assert_eq!(session.history(), before.as_slice());

        session.submit("três").await.unwrap();
        assert_eq!(session.exchanges(), 2);
    }

    #[tokio::test]
    async fn test_backend_sees_prior_history() {
        let mut session = ConversationSession::new(ScriptedBackend::default());
        session.submit("a").await.unwrap();
        session.submit("b").await.unwrap();

        let calls = session.backend.calls.lock().clone();
        assert_eq!(calls, vec![(0, "a".to_string()), (2, "b".to_string())]);
    }
}
