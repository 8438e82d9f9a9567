//! Keyboard input through rustyline.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use super::Prompter;

/// Interactive line editor with in-session history.
pub struct ConsolePrompter {
    editor: DefaultEditor,
}

impl ConsolePrompter {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to initialize line editor")?;
        Ok(Self { editor })
    }
}

impl Prompter for ConsolePrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) => {
                debug!("CTRL-C at prompt");
                None
            }
            Err(ReadlineError::Eof) => {
                debug!("CTRL-D at prompt");
                None
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}
