use rand::{
    rng,
    seq::SliceRandom,
};
use rusqlite::{
    params,
    OptionalExtension,
};

use super::Store;
use crate::core::{
    StudyError,
    Word,
};

pub const BUNDLE_SIZE: usize = 10;

impl Store {
    /// Words for the date's bundle, sampling and persisting one on first
    /// request. Stored ids that no longer resolve are skipped.
    pub fn bundle_for_date(&self, yyyymmdd: &str) -> Result<Vec<Word>, StudyError> {
        if let Some(ids) = self.bundle_ids(yyyymmdd)? {
            return self.words_by_ids(&ids);
        }

        let mut words = self.list_words()?;
        let mut rng = rng();
        words.shuffle(&mut rng);
        words.truncate(BUNDLE_SIZE);

        let ids: Vec<i64> = words.iter().map(|w| w.id).collect();
        let encoded = serde_json::to_string(&ids)?;
        self.conn().execute(
            "INSERT INTO daily_bundles (yyyymmdd, word_ids) VALUES (?1, ?2)",
            params![yyyymmdd, encoded],
        )?;
        Ok(words)
    }

    fn bundle_ids(&self, yyyymmdd: &str) -> Result<Option<Vec<i64>>, StudyError> {
        let conn = self.conn();
        let raw: Option<String> = conn
            .query_row(
                "SELECT word_ids FROM daily_bundles WHERE yyyymmdd = ?1",
                params![yyyymmdd],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
