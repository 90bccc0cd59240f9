//! Text translation between supported languages.

use super::detect::find_phrase;

/// Renders text from one language into another.
///
/// Implementations must return the input unchanged when `source == target`.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, source: &str, target: &str) -> String;
}

/// English phrases with their translations, checked in order.
const PHRASEBOOK: &[(&str, &[(&str, &str)])] = &[
    ("hello", &[("es", "hola"), ("fr", "bonjour"), ("pt", "olá")]),
    ("thank you", &[("es", "gracias"), ("fr", "merci"), ("pt", "obrigado")]),
    ("yes", &[("es", "sí"), ("fr", "oui"), ("pt", "sim")]),
    ("no", &[("es", "no"), ("fr", "non"), ("pt", "não")]),
];

/// Offline translator backed by a small English phrasebook.
///
/// English text containing a known phrase gets that phrase replaced.
/// Anything else is returned tagged with the target language so recipients
/// can tell it was not rendered natively.
#[derive(Debug, Clone, Default)]
pub struct PhrasebookTranslator;

impl PhrasebookTranslator {
    pub fn new() -> Self {
        Self
    }

    fn from_phrasebook(text: &str, target: &str) -> Option<String> {
        let spans = word_spans(text);
        let words: Vec<String> = spans
            .iter()
            .map(|&(start, end)| text[start..end].to_lowercase())
            .collect();

        PHRASEBOOK.iter().find_map(|(phrase, renderings)| {
            let (_, rendering) = renderings.iter().find(|(lang, _)| *lang == target)?;
            let first = find_phrase(&words, phrase)?;
            let last = first + phrase.split_whitespace().count() - 1;
            let (start, _) = spans[first];
            let (_, end) = spans[last];

            let capitalized = text[start..]
                .chars()
                .next()
                .map(char::is_uppercase)
                .unwrap_or(false);
            let replacement = if capitalized {
                capitalize(rendering)
            } else {
                rendering.to_string()
            };

            Some(format!("{}{}{}", &text[..start], replacement, &text[end..]))
        })
    }
}

impl Translator for PhrasebookTranslator {
    fn translate(&self, text: &str, source: &str, target: &str) -> String {
        if source.eq_ignore_ascii_case(target) {
            return text.to_string();
        }

        if source.eq_ignore_ascii_case("en") {
            if let Some(translated) = Self::from_phrasebook(text, target) {
                return translated;
            }
        }

        format!("[Translated to {}] {}", target.to_uppercase(), text)
    }
}

/// Byte ranges of the alphabetic words in `text`.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match (c.is_alphabetic(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_language_is_identity() {
        let t = PhrasebookTranslator::new();
        assert_eq!(t.translate("Hola amigos", "es", "es"), "Hola amigos");
    }

    #[test]
    fn test_phrase_replacement_keeps_capitalization() {
        let t = PhrasebookTranslator::new();
        assert_eq!(t.translate("Hello everyone", "en", "fr"), "Bonjour everyone");
        assert_eq!(t.translate("well hello there", "en", "es"), "well hola there");
    }

    #[test]
    fn test_multi_word_phrase() {
        let t = PhrasebookTranslator::new();
        assert_eq!(t.translate("Thank you, friend!", "en", "pt"), "Obrigado, friend!");
    }

    #[test]
    fn test_unknown_text_is_tagged() {
        let t = PhrasebookTranslator::new();
        assert_eq!(
            t.translate("Fresh mangoes today", "en", "fr"),
            "[Translated to FR] Fresh mangoes today"
        );
        assert_eq!(t.translate("Hola amigos", "es", "en"), "[Translated to EN] Hola amigos");
    }

    #[test]
    fn test_phrase_must_be_whole_words() {
        let t = PhrasebookTranslator::new();
        assert_eq!(t.translate("nothing", "en", "es"), "[Translated to ES] nothing");
    }

    #[test]
    fn test_word_spans_handle_accents() {
        let text = "¡olá, não!";
        let words: Vec<&str> = word_spans(text)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect();
        assert_eq!(words, vec!["olá", "não"]);
    }
}
