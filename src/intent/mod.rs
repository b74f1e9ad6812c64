//! Keyword intent check deciding between catalog search and conversation.

mod classifier;
mod lemmatizer;

pub use classifier::{
    IntentClassifier, KeywordIntentClassifier, ENGLISH_KEYWORDS, SPANISH_KEYWORDS,
};
pub use lemmatizer::{Lemmatizer, Token};
