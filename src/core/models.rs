use serde::{
    Deserialize,
    Serialize,
};

/// A reading category as tagged by the remote subject data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Onyomi,
    Kunyomi,
    Nanori,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub reading: String,
    #[serde(rename = "type")]
    pub kind: ReadingKind,
}

/// One kanji subject as cached from the remote API. Never mutated locally,
/// only rebuilt from the payload file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanjiItem {
    pub id: u64,
    pub characters: Option<String>, // Display form; the API leaves it unset for image-only subjects
    pub meanings: Vec<String>,
    pub readings: Vec<Reading>,
}

impl KanjiItem {
    pub fn readings_of_kind<'a>(
        &'a self,
        kind: &'a ReadingKind,
    ) -> impl Iterator<Item = &'a Reading> + 'a {
        self.readings.iter().filter(move |r| &r.kind == kind)
    }
}

/// Aggregate review counters, one row in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReviewStats {
    pub total: u64,
    pub correct: u64,
    pub wrong: u64,
}

impl ReviewStats {
    /// Percentage of correct reviews, 0.0 when nothing has been reviewed yet.
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }
}

/// A user-managed vocabulary word for listening practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub id: i64,
    pub word: String,           // Japanese surface form
    pub translation: String,    // English gloss
    pub audio_path: Option<String>,
    pub tags: Option<String>,   // Comma-separated
    pub created_at: String,
    pub updated_at: String,
}
