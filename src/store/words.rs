use std::path::Path;

use log::warn;
use rusqlite::{
    params,
    OptionalExtension,
};

use super::Store;
use crate::core::{
    StudyError,
    Word,
};

fn row_to_word(row: &rusqlite::Row<'_>) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        word: row.get(1)?,
        translation: row.get(2)?,
        audio_path: row.get(3)?,
        tags: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const WORD_COLUMNS: &str = "id, word, translation, audio_path, tags, created_at, updated_at";

impl Store {
    pub fn insert_word(
        &self,
        word: &str,
        translation: &str,
        tags: Option<&str>,
        audio_path: Option<&str>,
    ) -> Result<i64, StudyError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO words (word, translation, tags, audio_path) VALUES (?1, ?2, ?3, ?4)",
            params![word, translation, tags, audio_path],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_word(
        &self,
        id: i64,
        word: &str,
        translation: &str,
        tags: Option<&str>,
        audio_path: Option<&str>,
    ) -> Result<bool, StudyError> {
        let rows = self.conn().execute(
            "UPDATE words SET word = ?1, translation = ?2, tags = ?3, audio_path = ?4, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?5",
            params![word, translation, tags, audio_path, id],
        )?;
        Ok(rows > 0)
    }

    pub fn set_word_audio(&self, id: i64, audio_path: &str) -> Result<bool, StudyError> {
        let rows = self.conn().execute(
            "UPDATE words SET audio_path = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![audio_path, id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_word(&self, id: i64) -> Result<bool, StudyError> {
        let rows = self.conn().execute("DELETE FROM words WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn get_word(&self, id: i64) -> Result<Option<Word>, StudyError> {
        let conn = self.conn();
        let word = conn
            .query_row(
                &format!("SELECT {WORD_COLUMNS} FROM words WHERE id = ?1"),
                params![id],
                row_to_word,
            )
            .optional()?;
        Ok(word)
    }

    /// All words, newest first.
    pub fn list_words(&self) -> Result<Vec<Word>, StudyError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {WORD_COLUMNS} FROM words ORDER BY id DESC"))?;
        let words = stmt
            .query_map([], row_to_word)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(words)
    }

    /// Resolve ids to words, preserving input order. Ids that no longer exist
    /// are skipped.
    pub fn words_by_ids(&self, ids: &[i64]) -> Result<Vec<Word>, StudyError> {
        let mut words = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(word) = self.get_word(*id)? {
                words.push(word);
            }
        }
        Ok(words)
    }
}

/// Write all words as CSV. Returns the number of rows written.
pub fn export_csv(store: &Store, path: &Path) -> Result<usize, StudyError> {
    let words = store.list_words()?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["word", "translation", "tags", "audio_path"])?;
    for w in &words {
        writer.write_record([
            w.word.as_str(),
            w.translation.as_str(),
            w.tags.as_deref().unwrap_or(""),
            w.audio_path.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(words.len())
}

/// Import words from CSV with a `word,translation,tags,audio_path` header.
/// Rows missing word or translation are skipped. Returns the number imported.
pub fn import_csv(store: &Store, path: &Path) -> Result<usize, StudyError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let word_idx = column("word")
        .ok_or_else(|| StudyError::Custom("CSV is missing a 'word' column".to_string()))?;
    let translation_idx = column("translation")
        .ok_or_else(|| StudyError::Custom("CSV is missing a 'translation' column".to_string()))?;
    let tags_idx = column("tags");
    let audio_idx = column("audio_path");

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut imported = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let word = record.get(word_idx).map(str::trim).unwrap_or_default();
        let translation = record.get(translation_idx).map(str::trim).unwrap_or_default();
        if word.is_empty() || translation.is_empty() {
            warn!("skipping CSV row {}: missing word or translation", line + 2);
            continue;
        }
        let tags = field(&record, tags_idx);
        let audio = field(&record, audio_idx);
        store.insert_word(word, translation, tags.as_deref(), audio.as_deref())?;
        imported += 1;
    }
    Ok(imported)
}
