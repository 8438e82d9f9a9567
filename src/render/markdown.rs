//! Markdown handling for console display and speech.

use std::sync::LazyLock;

use colored::Colorize;
use regex::Regex;

static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"));
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.*?)__").expect("valid regex"));
static ITALIC_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("valid regex"));
// Word boundaries keep snake_case identifiers intact
static ITALIC_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b_([^_\n]+?)_\b").expect("valid regex"));
static HEADING_MARKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#+[ \t]?").expect("valid regex"));
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#+\s+(.*)$").expect("valid regex"));
static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)[*-]\s+(.*)$").expect("valid regex"));

/// Remove emphasis and heading markers so the synthesizer does not read them aloud.
///
/// Removing one marker can expose another (`_*_a_*_` becomes `__a__`), so the
/// passes repeat until nothing changes. Every replacement shortens the text.
pub fn strip_markdown(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_pass(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_pass(text: &str) -> String {
    let text = BOLD_STARS.replace_all(text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STARS.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORES.replace_all(&text, "$1");
    HEADING_MARKS.replace_all(&text, "").into_owned()
}

/// Lightly format a response for the terminal.
///
/// Headings become bold, `**bold**` spans are emboldened and bullets are
/// drawn as dots. Everything else is printed as-is.
pub fn format_for_console(text: &str) -> String {
    text.lines()
        .map(|line| {
            if let Some(caps) = HEADING_LINE.captures(line) {
                return caps[1].trim_end_matches('#').trim_end().bold().cyan().to_string();
            }

            let (indent, body) = match BULLET_LINE.captures(line) {
                Some(caps) => (format!("{}  • ", &caps[1]), caps[2].to_string()),
                None => (String::new(), line.to_string()),
            };

            let body = BOLD_STARS.replace_all(&body, |caps: &regex::Captures| caps[1].bold().to_string());
            format!("{}{}", indent, body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bold_example() {
        assert_eq!(strip_markdown("**Olá** mundo"), "Olá mundo");
    }

    #[test]
    fn test_strip_all_markers() {
        let input = "## Passo 1\nToque em **Configurações**, depois em __Wi-Fi__ e *espere* um _pouco_.";
        assert_eq!(strip_markdown(input), "Passo 1\nToque em Configurações, depois em Wi-Fi e espere um pouco.");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let inputs = [
            "**Olá** mundo",
            "***muito importante***",
            "# Título\n*um* __dois__ _três_ **quatro**",
            "**a* b*",
            "__**misturado**__ e _*junto*_",
            "### ## #",
        ];
        for input in inputs {
            let once = strip_markdown(input);
            assert_eq!(strip_markdown(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_exposed_markers_are_removed() {
        assert_eq!(strip_markdown("_*_a_*_"), "a");
        assert_eq!(strip_markdown("___#_"), "");
        assert_eq!(strip_markdown("*_*___"), "");
    }

    #[test]
    fn test_strip_is_idempotent_for_all_short_marker_strings() {
        const ALPHABET: [char; 5] = ['*', '_', '#', 'a', ' '];

        let mut current = vec![String::new()];
        for _ in 0..7 {
            let mut longer = Vec::with_capacity(current.len() * ALPHABET.len());
            for prefix in &current {
                for c in ALPHABET {
                    let mut s = prefix.clone();
                    s.push(c);
                    let once = strip_markdown(&s);
                    assert_eq!(strip_markdown(&once), once, "not idempotent for {:?}", s);
                    longer.push(s);
                }
            }
            current = longer;
        }
    }

    #[test]
    fn test_snake_case_untouched() {
        assert_eq!(strip_markdown("abra o arquivo meu_arquivo_novo"), "abra o arquivo meu_arquivo_novo");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Toque no botão verde. Conseguiu?";
        assert_eq!(strip_markdown(text), text);
    }

    #[test]
    fn test_console_format_structure() {
        colored::control::set_override(false);
        let formatted = format_for_console("# Como ligar\n* Aperte o botão\n- Espere **três** segundos\nPronto!");
        assert_eq!(formatted, "Como ligar\n  • Aperte o botão\n  • Espere três segundos\nPronto!");
    }
}
