use serde::Serialize;

/// Sentences of one segmentation pass, indexed by marker id.
///
/// Index `n` is the text read aloud for the marker with id `n`. Fragments
/// too short to carry a marker still occupy their slot so that marker ids
/// and list positions never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SentenceList(Vec<String>);

impl SentenceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sentence, returning its index.
    pub fn push(&mut self, sentence: String) -> usize {
        self.0.push(sentence);
        self.0.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for SentenceList {
    fn from(sentences: Vec<String>) -> Self {
        Self(sentences)
    }
}
