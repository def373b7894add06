// Shared prompt fragments.
// Each service that needs oracle calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "\
Respondé ÚNICAMENTE con un JSON válido. \
Sin markdown, sin bloques de código, sin explicaciones fuera del JSON.";

/// Appended to every extraction prompt.
pub const NO_INVENTION_INSTRUCTION: &str = "\
No inventes datos que no estén en la entrada. \
Si no podés inferir un campo con certeza, dejalo vacío: \"\" para strings, [] para arrays, \
0, false o null donde aplique.";

/// Joins a system prompt body with the shared JSON-only instruction.
pub fn json_system(body: &str) -> String {
    format!("{body}\n\n{JSON_ONLY_INSTRUCTION}")
}

/// Cuts `text` to at most `max_chars` characters, on a char boundary.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_respects_char_boundaries() {
        assert_eq!(clip("añoñaño", 3), "año");
        assert_eq!(clip("corto", 80), "corto");
        assert_eq!(clip("", 5), "");
    }

    #[test]
    fn test_json_system_appends_instruction() {
        let system = json_system("Sos un parser.");
        assert!(system.starts_with("Sos un parser."));
        assert!(system.ends_with(JSON_ONLY_INSTRUCTION));
    }
}
