//! User input: keyboard lines and spoken phrases behind one event source.

mod console;
mod multiplexer;

pub use console::ConsolePrompter;
pub use multiplexer::{InputEvent, InputMultiplexer};

#[cfg(test)]
pub(crate) use multiplexer::tests::{ScriptedListener, ScriptedPrompter};

/// Line-oriented keyboard input.
pub trait Prompter {
    /// Show `prompt` and read one line. `None` means input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}
