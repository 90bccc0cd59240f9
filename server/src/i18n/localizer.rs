//! Detect-then-translate step of the chat pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{KeywordDetector, LanguageDetector, LanguageSet, PhrasebookTranslator, Translator};

/// A chat text with its detected language and one rendering per
/// supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub detected_language: String,
    pub variants: BTreeMap<String, String>,
}

/// Runs detection and translation for a message across the supported set.
#[derive(Clone)]
pub struct Localizer {
    languages: LanguageSet,
    detector: Arc<dyn LanguageDetector>,
    translator: Arc<dyn Translator>,
}

impl Localizer {
    pub fn new(
        languages: LanguageSet,
        detector: Arc<dyn LanguageDetector>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            languages,
            detector,
            translator,
        }
    }

    /// Keyword detector and phrasebook translator over `languages`.
    pub fn with_defaults(languages: LanguageSet) -> Self {
        let detector = Arc::new(KeywordDetector::new(languages.clone()));
        Self::new(languages, detector, Arc::new(PhrasebookTranslator::new()))
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn localize(&self, text: &str) -> Localized {
        let detected = self.detector.detect(text);
        // A detector outside the supported set still has to yield a usable code
        let detected_language = self.languages.resolve(Some(detected.as_str())).to_string();

        let variants = self
            .languages
            .iter()
            .map(|language| {
                let rendered = if language == detected_language {
                    text.to_string()
                } else {
                    self.translator
                        .translate(text, &detected_language, language)
                };
                (language.to_string(), rendered)
            })
            .collect();

        Localized {
            detected_language,
            variants,
        }
    }
}
