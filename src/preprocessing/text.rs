//! Text tokenization and vocabulary building

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Lowercasing word tokenizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextTokenizer;

impl TextTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Split on anything that is not alphanumeric or an apostrophe
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .map(|s| s.trim_matches('\''))
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

/// Word-to-index vocabulary. Index 0 is reserved for unknown words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    tokenizer: TextTokenizer,
    word_to_id: HashMap<String, usize>,
    id_to_word: Vec<String>,
}

impl Vocabulary {
    pub const UNKNOWN: &'static str = "<unk>";
    pub const UNKNOWN_ID: usize = 0;

    pub fn new(tokenizer: TextTokenizer) -> Self {
        Self {
            tokenizer,
            word_to_id: HashMap::new(),
            id_to_word: vec![Self::UNKNOWN.to_string()],
        }
    }

    /// Build the vocabulary from documents. Words are ordered by document
    /// frequency (descending), ties broken alphabetically.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> &mut Self {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for doc in documents {
            let unique: HashSet<String> = self.tokenizer.tokenize(doc.as_ref()).into_iter().collect();
            for token in unique {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = doc_freq.into_iter().collect();
        // stable sort keeps alphabetical order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        self.word_to_id.clear();
        self.id_to_word = vec![Self::UNKNOWN.to_string()];
        for (word, _) in ranked {
            self.word_to_id.insert(word.clone(), self.id_to_word.len());
            self.id_to_word.push(word);
        }
        self
    }

    /// Map a document to word ids; unknown words map to `UNKNOWN_ID`
    pub fn vectorize(&self, text: &str) -> Vec<usize> {
        self.tokenizer
            .tokenize(text)
            .iter()
            .map(|t| self.word_to_id.get(t).copied().unwrap_or(Self::UNKNOWN_ID))
            .collect()
    }

    /// Number of entries including the unknown slot
    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_word.len() <= 1
    }

    pub fn words(&self) -> &[String] {
        &self.id_to_word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokenizer = TextTokenizer::new();
        let tokens = tokenizer.tokenize("Oh, I'm SO glad you're here!");
        assert_eq!(tokens, vec!["oh", "i'm", "so", "glad", "you're", "here"]);
    }

    #[test]
    fn test_tokenize_strips_quotes() {
        let tokens = TextTokenizer::new().tokenize("'Really' -- 'yes'...");
        assert_eq!(tokens, vec!["really", "yes"]);
    }

    #[test]
    fn test_vocabulary_fit_and_vectorize() {
        let docs = vec!["great job", "great idea", "bad idea"];
        let mut vocab = Vocabulary::new(TextTokenizer::new());
        vocab.fit(&docs);

        // unk + great, idea (df 2) + bad, job (df 1)
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.words()[1], "great");
        assert_eq!(vocab.words()[2], "idea");
        assert_eq!(vocab.words()[3], "bad");

        let ids = vocab.vectorize("great unseen idea");
        assert_eq!(ids, vec![1, Vocabulary::UNKNOWN_ID, 2]);
    }

    #[test]
    fn test_vocabulary_counts_documents_not_tokens() {
        let docs = vec!["ha ha ha", "oh no", "oh"];
        let mut vocab = Vocabulary::new(TextTokenizer::new());
        vocab.fit(&docs);
        assert_eq!(vocab.words()[1], "oh");
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut vocab = Vocabulary::new(TextTokenizer::new());
        vocab.fit(&["", "..."]);
        assert!(vocab.is_empty());
        assert_eq!(vocab.vectorize("anything"), vec![Vocabulary::UNKNOWN_ID]);
    }
}
