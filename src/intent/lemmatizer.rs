//! Dictionary + suffix-rule lemmatizer for Spanish and English input.
//!
//! Covers the vocabulary the intent check cares about. Unknown Spanish words
//! are returned unchanged, unknown ASCII words go through a handful of
//! English inflection rules.

use serde::Serialize;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// A token of user input together with its dictionary form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
}

const AR_ENDINGS: &[&str] = &[
    "ar", "o", "as", "a", "amos", "áis", "an", "é", "aste", "ó", "asteis", "aron",
    "aba", "abas", "ábamos", "aban", "aré", "arás", "ará", "aremos", "arán", "ando", "ado",
    "ada", "ados", "adas", "e", "es", "emos", "en", "ad", "arme", "arla", "arlo", "ame",
];

const IR_ENDINGS: &[&str] = &[
    "ir", "o", "es", "e", "imos", "ís", "en", "í", "iste", "ió", "isteis", "ieron", "ía",
    "ías", "íamos", "ían", "iré", "irás", "irá", "iremos", "irán", "iendo", "ido", "ida",
    "idos", "idas", "a", "as", "amos", "an", "id", "irme", "irla", "irlo", "eme",
];

#[derive(Debug, Clone)]
pub struct Lemmatizer {
    forms: HashMap<String, String>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        let mut lemmatizer = Lemmatizer::empty();

        lemmatizer.register_ar_verb("buscar");
        lemmatizer.register_ar_verb("escuchar");
        lemmatizer.register_ar_verb("tocar");
        lemmatizer.register_ir_verb("reproducir");
        // Spelling changes the regular tables don't produce.
        for form in ["busqué", "busque", "busques", "busquemos", "busquen", "búscame", "búscala"] {
            lemmatizer.register_form(form, "buscar");
        }
        for form in ["toqué", "toque", "toques", "toquen", "tócala"] {
            lemmatizer.register_form(form, "tocar");
        }
        for form in ["reproduzco", "reproduzca", "reproduzcas", "reproduzcan", "reprodúcela"] {
            lemmatizer.register_form(form, "reproducir");
        }
        for form in ["escúchame", "escúchala"] {
            lemmatizer.register_form(form, "escuchar");
        }

        lemmatizer.register_noun("canción", &["canciones", "cancion"]);
        lemmatizer.register_noun("tema", &["temas"]);
        lemmatizer.register_noun("track", &["tracks"]);
        lemmatizer.register_noun("song", &["songs"]);

        // English irregulars the suffix rules get wrong.
        lemmatizer.register_form("played", "play");
        lemmatizer.register_form("playing", "play");
        lemmatizer.register_form("searches", "search");
        lemmatizer.register_form("searching", "search");
        lemmatizer.register_form("searched", "search");

        lemmatizer
    }
}

impl Lemmatizer {
    pub fn empty() -> Self {
        Self {
            forms: HashMap::new(),
        }
    }

    pub fn register_form(&mut self, form: &str, lemma: &str) {
        self.forms.insert(form.to_lowercase(), lemma.to_lowercase());
    }

    /// Registers the regular conjugations of a Spanish `-ar` verb.
    pub fn register_ar_verb(&mut self, infinitive: &str) {
        self.register_verb(infinitive, "ar", AR_ENDINGS);
    }

    /// Registers the regular conjugations of a Spanish `-ir` verb.
    pub fn register_ir_verb(&mut self, infinitive: &str) {
        self.register_verb(infinitive, "ir", IR_ENDINGS);
    }

    fn register_verb(&mut self, infinitive: &str, suffix: &str, endings: &[&str]) {
        let Some(stem) = infinitive.strip_suffix(suffix) else {
            return;
        };
        for ending in endings {
            let form = format!("{}{}", stem, ending);
            self.forms
                .entry(form)
                .or_insert_with(|| infinitive.to_string());
        }
    }

    pub fn register_noun(&mut self, lemma: &str, forms: &[&str]) {
        self.register_form(lemma, lemma);
        for form in forms {
            self.register_form(form, lemma);
        }
    }

    /// Lowercases and splits `text` into words.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .unicode_words()
            .map(|w| w.to_string())
            .collect()
    }

    pub fn lemma(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if let Some(lemma) = self.forms.get(&word) {
            return lemma.clone();
        }
        if word.is_ascii() {
            return english_lemma(&word);
        }
        word
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        Self::tokenize(text)
            .into_iter()
            .map(|text| {
                let lemma = self.lemma(&text);
                Token { text, lemma }
            })
            .collect()
    }
}

fn english_lemma(word: &str) -> String {
    let len = word.len();

    if len > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..len - 3]);
    }
    if len > 5 && word.ends_with("ing") {
        return word[..len - 3].to_string();
    }
    if len > 4 && word.ends_with("ed") && !word.ends_with("eed") {
        return word[..len - 2].to_string();
    }
    if len > 4 && word.ends_with("es") {
        let stem = &word[..len - 2];
        if stem.ends_with("ch") || stem.ends_with("sh") || stem.ends_with('x') || stem.ends_with("ss")
        {
            return stem.to_string();
        }
    }
    if len > 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return word[..len - 1].to_string();
    }

    word.to_string()
}
