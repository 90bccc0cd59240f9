//! Keyword-scoring language detection.

use super::LanguageSet;

/// Best-guess language identification for raw chat text.
///
/// Implementations must be pure: the same text always yields the same code.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> String;
}

/// Common words per language. Multi-word entries match as consecutive words.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &["hello", "thank", "please", "yes", "no", "what", "how", "where", "when", "the"],
    ),
    (
        "es",
        &["hola", "gracias", "por favor", "sí", "no", "qué", "cómo", "donde", "cuando", "que"],
    ),
    (
        "fr",
        &["bonjour", "merci", "oui", "non", "comment", "que", "où", "quand", "je", "tu"],
    ),
    (
        "pt",
        &["olá", "obrigado", "obrigada", "por favor", "sim", "não", "que", "como", "onde", "quando"],
    ),
];

/// Scores each supported language by how many of its keywords occur in the
/// text and picks the highest. Ties go to the language listed first in the
/// supported set, so the fallback wins any tie it takes part in.
#[derive(Debug, Clone)]
pub struct KeywordDetector {
    languages: LanguageSet,
}

impl KeywordDetector {
    pub fn new(languages: LanguageSet) -> Self {
        Self { languages }
    }

    fn score(words: &[String], language: &str) -> usize {
        let Some((_, keywords)) = KEYWORDS.iter().find(|(code, _)| *code == language) else {
            return 0;
        };
        keywords
            .iter()
            .filter(|keyword| contains_phrase(words, keyword))
            .count()
    }
}

impl LanguageDetector for KeywordDetector {
    fn detect(&self, text: &str) -> String {
        let words = tokenize(text);

        let mut best: Option<(&str, usize)> = None;
        for language in self.languages.iter() {
            let score = Self::score(&words, language);
            if score > best.map(|(_, s)| s).unwrap_or(0) {
                best = Some((language, score));
            }
        }

        best.map(|(language, _)| language)
            .unwrap_or_else(|| self.languages.fallback())
            .to_string()
    }
}

/// Lower-cased alphabetic words of `text`.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `phrase` occurs in `words` as a run of consecutive whole words.
pub(crate) fn contains_phrase(words: &[String], phrase: &str) -> bool {
    find_phrase(words, phrase).is_some()
}

/// Index of the first word of `phrase` within `words`.
pub(crate) fn find_phrase(words: &[String], phrase: &str) -> Option<usize> {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return None;
    }
    words
        .windows(needle.len())
        .position(|window| window.iter().zip(&needle).all(|(w, n)| w == n))
}
