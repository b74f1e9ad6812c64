use std::collections::HashSet;

use super::lemmatizer::{Lemmatizer, Token};

/// Keywords of the localized (Spanish) deployment.
pub const SPANISH_KEYWORDS: &[&str] = &["buscar", "canción", "track", "escuchar", "reproducir"];

/// Keywords of the English deployment.
pub const ENGLISH_KEYWORDS: &[&str] = &["search", "song", "track", "listen", "play"];

/// Decides whether free text asks for a catalog search.
pub trait IntentClassifier: Send + Sync {
    fn is_catalog_search(&self, text: &str) -> bool;

    /// The part of `text` left once the trigger words are removed.
    fn extract_search_phrase(&self, text: &str) -> String;

    /// Token/lemma breakdown of `text`, for display.
    fn analyze(&self, text: &str) -> Vec<Token>;
}

/// Binary classifier over a fixed set of lemmatized trigger words.
#[derive(Debug, Clone)]
pub struct KeywordIntentClassifier {
    keywords: HashSet<String>,
    lemmatizer: Lemmatizer,
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new(
            SPANISH_KEYWORDS.iter().chain(ENGLISH_KEYWORDS.iter()).copied(),
            Lemmatizer::default(),
        )
    }
}

impl KeywordIntentClassifier {
    pub fn new<'a>(keywords: impl IntoIterator<Item = &'a str>, lemmatizer: Lemmatizer) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            lemmatizer,
        }
    }

    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn is_catalog_search(&self, text: &str) -> bool {
        self.lemmatizer
            .analyze(text)
            .iter()
            .any(|token| self.keywords.contains(&token.lemma))
    }

    fn extract_search_phrase(&self, text: &str) -> String {
        self.lemmatizer
            .analyze(text)
            .into_iter()
            .filter(|token| !self.keywords.contains(&token.lemma))
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    fn analyze(&self, text: &str) -> Vec<Token> {
        self.lemmatizer.analyze(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_not_a_search() {
        let classifier = KeywordIntentClassifier::default();
        assert!(!classifier.is_catalog_search(""));
        assert!(!classifier.is_catalog_search("   "));
    }

    #[test]
    fn test_non_keyword_text_is_not_a_search() {
        let classifier = KeywordIntentClassifier::default();
        for text in [
            "hola, ¿cómo estás?",
            "what is the weather like today",
            "tell me a joke",
            "me gusta el verano",
        ] {
            assert!(!classifier.is_catalog_search(text), "{}", text);
        }
    }

    #[test]
    fn test_keywords_in_any_case_trigger_search() {
        let classifier = KeywordIntentClassifier::default();
        for text in [
            "BUSCAR Bohemian Rhapsody",
            "Quiero escuchar algo de Queen",
            "reproduce Despacito",
            "una canción de Shakira",
            "Play some Daft Punk",
            "search Imagine",
            "I want to LISTEN to jazz",
            "songs by Adele",
            "Track Yellow",
        ] {
            assert!(classifier.is_catalog_search(text), "{}", text);
        }
    }

    #[test]
    fn test_extract_search_phrase_strips_keywords() {
        let classifier = KeywordIntentClassifier::default();
        assert_eq!(
            classifier.extract_search_phrase("Buscar canción Bohemian Rhapsody"),
            "bohemian rhapsody"
        );
        assert_eq!(
            classifier.extract_search_phrase("play Yellow Submarine"),
            "yellow submarine"
        );
        assert_eq!(classifier.extract_search_phrase("buscar"), "");
    }

    #[test]
    fn test_custom_keyword_set() {
        let classifier =
            KeywordIntentClassifier::new(["suchen", "lied"], Lemmatizer::empty());
        assert!(classifier.is_catalog_search("Lied suchen"));
        assert!(!classifier.is_catalog_search("play something"));
        assert_eq!(classifier.keywords().len(), 2);
    }
}
