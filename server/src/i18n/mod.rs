//! Language handling for the chat relay: the supported language set,
//! language detection, translation, and the per-message localizer that
//! ties them together.

pub mod detect;
pub mod localizer;
pub mod translate;

pub use detect::{KeywordDetector, LanguageDetector};
pub use localizer::{Localized, Localizer};
pub use translate::{PhrasebookTranslator, Translator};

/// Ordered set of language codes the relay produces variants for.
///
/// The first entry is always the fallback language. Codes are stored
/// lower-cased and deduplicated, preserving first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSet {
    codes: Vec<String>,
}

impl LanguageSet {
    /// Build a set from a fallback language and additional targets.
    /// An empty fallback degrades to `"en"`.
    pub fn new<I, S>(fallback: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fallback = normalize(fallback);
        let fallback = if fallback.is_empty() {
            "en".to_string()
        } else {
            fallback
        };

        let mut codes = vec![fallback];
        for target in targets {
            let code = normalize(target.as_ref());
            if !code.is_empty() && !codes.contains(&code) {
                codes.push(code);
            }
        }

        Self { codes }
    }

    pub fn fallback(&self) -> &str {
        &self.codes[0]
    }

    pub fn contains(&self, code: &str) -> bool {
        let code = normalize(code);
        self.codes.iter().any(|c| *c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    /// Map an optional preference onto the set, falling back when the
    /// preference is absent or unsupported.
    pub fn resolve<'a>(&'a self, preferred: Option<&str>) -> &'a str {
        preferred
            .map(normalize)
            .and_then(|code| self.codes.iter().find(|c| **c == code))
            .map(String::as_str)
            .unwrap_or_else(|| self.fallback())
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self::new("en", ["es", "fr", "pt"])
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
