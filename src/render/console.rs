//! Terminal output helpers.
//!
//! Everything the user sees goes to stdout through these functions so the
//! look of the conversation stays consistent. Logs go to stderr via tracing.

use std::io::Write;

use colored::Colorize;

const SEPARATOR_WIDTH: usize = 50;

/// Print the welcome panel shown once at startup.
pub fn welcome() {
    let lines = [
        "Assistente de Voz para Terceira Idade".bold().to_string(),
        String::new(),
        "Fale ou digite sua dúvida.".to_string(),
        "Diga 'sair' ou digite para encerrar.".to_string(),
    ];
    let plain = ["Assistente de Voz para Terceira Idade", "", "Fale ou digite sua dúvida.", "Diga 'sair' ou digite para encerrar."];

    println!("{}", panel("Bem-vindo", &lines, &plain));
}

/// Draw a bordered box; `plain` carries the uncolored text used for widths.
fn panel(title: &str, lines: &[String], plain: &[&str]) -> String {
    let width = plain.iter().map(|l| l.chars().count()).max().unwrap_or(0).max(title.chars().count() + 4);
    let title_fill = width + 2 - title.chars().count() - 2;
    let left = title_fill / 2;
    let right = title_fill - left;

    let mut out = format!("{}\n", format!("╭{} {} {}╮", "─".repeat(left), title, "─".repeat(right)).blue());
    for (line, raw) in lines.iter().zip(plain) {
        let pad = width - raw.chars().count();
        out.push_str(&format!("{} {}{} {}\n", "│".blue(), line, " ".repeat(pad), "│".blue()));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(width + 2)).blue().to_string());
    out
}

pub fn dim(message: &str) {
    println!("{}", message.dimmed());
}

pub fn warn(message: &str) {
    println!("{}", message.yellow());
}

pub fn error(message: &str) {
    println!("{}", message.red());
}

pub fn critical(message: &str) {
    println!("{}", message.red().bold());
}

pub fn success(message: &str) {
    println!("{}", message.green());
}

/// Shown right before the microphone opens for a phrase.
pub fn listening() {
    println!("{}", "🎤 PODE FALAR AGORA...".green().bold());
    let _ = std::io::stdout().flush();
}

/// Echo of what the user said or typed.
pub fn user_said(text: &str) {
    println!("{} {}", "Você:".bold(), text);
}

pub fn thinking() {
    println!("{}", "Pensando na resposta...".dimmed());
}

/// Print a full assistant reply with its header and trailing separator.
pub fn assistant_reply(formatted: &str) {
    println!();
    println!("{}", "Assistente:".cyan().bold());
    println!("{}", formatted);
    println!("{}", separator());
}

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH).dimmed().to_string()
}

/// Block until the user presses Enter (or stdin closes).
pub fn wait_for_enter(prompt: &str) {
    print!("{}", prompt);
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
