use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use grid_types::Language;

/// Fold a submission into its canonical dictionary form: lowercase,
/// diacritics stripped. Grid letters are already canonical, so the same
/// folding applies to both sides of every lookup.
pub fn normalize_word(word: &str, language: Language) -> String {
    let lowered = word.trim().to_lowercase();
    match language {
        Language::English => lowered,
        Language::Spanish => lowered
            .chars()
            .map(|c| match c {
                'á' => 'a',
                'é' => 'e',
                'í' => 'i',
                'ó' => 'o',
                'ú' | 'ü' => 'u',
                other => other,
            })
            .collect(),
    }
}

/// Language-specific word list; exact match after normalization.
pub struct WordList {
    language: Language,
    words: HashSet<String>,
}

impl WordList {
    /// Parse a newline-separated list. Blank lines and `#` comments are
    /// skipped; entries are normalized on the way in.
    pub fn new(language: Language, word_list: &str) -> Self {
        let words = word_list
            .lines()
            .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
            .map(|word| normalize_word(word, language))
            .collect();

        Self { language, words }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.words.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// All loaded word lists, keyed by language.
pub struct WordLibrary {
    lists: HashMap<Language, WordList>,
}

impl WordLibrary {
    pub fn new(lists: Vec<WordList>) -> Self {
        Self {
            lists: lists.into_iter().map(|l| (l.language(), l)).collect(),
        }
    }

    /// Load `<code>.txt` files (en.txt, es.txt) from a directory. At
    /// least one known language file must be present.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut lists = Vec::new();

        for language in [Language::English, Language::Spanish] {
            let path = dir.join(format!("{}.txt", language.code()));
            if path.exists() {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading word list {}", path.display()))?;
                lists.push(WordList::new(language, &text));
            }
        }

        if lists.is_empty() {
            return Err(anyhow!(
                "No word lists found in {} (expected en.txt / es.txt)",
                dir.display()
            ));
        }

        Ok(Self::new(lists))
    }

    pub fn contains(&self, normalized: &str, language: Language) -> bool {
        self.lists
            .get(&language)
            .map(|list| list.contains(normalized))
            .unwrap_or(false)
    }
}
