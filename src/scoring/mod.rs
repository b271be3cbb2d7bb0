use crate::{
    core::{
        ReviewStats,
        StudyError,
    },
    store::Store,
};

/// Aggregate review counters kept in the store's singleton `review_stats`
/// row. Each mutation is a single SQL statement, so `total == correct +
/// wrong` holds at every observable point.
pub struct ScoringService<'a> {
    store: &'a Store,
}

impl<'a> ScoringService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create the counters row with zeros if it does not exist yet.
    pub fn ensure_initialized(&self) -> Result<(), StudyError> {
        self.store.conn().execute(
            "INSERT OR IGNORE INTO review_stats (id, total, correct, wrong) VALUES (1, 0, 0, 0)",
            [],
        )?;
        Ok(())
    }

    /// Count one review: `total` plus exactly one of `correct`/`wrong`.
    pub fn record(&self, correct: bool) -> Result<(), StudyError> {
        self.ensure_initialized()?;
        let sql = if correct {
            "UPDATE review_stats SET total = total + 1, correct = correct + 1 WHERE id = 1"
        } else {
            "UPDATE review_stats SET total = total + 1, wrong = wrong + 1 WHERE id = 1"
        };
        self.store.conn().execute(sql, [])?;
        Ok(())
    }

    /// Typo forgiveness: move one review from wrong to correct, leaving
    /// `total` unchanged. A no-op when nothing is wrong yet; returns whether
    /// anything changed.
    pub fn undo_last_wrong(&self) -> Result<bool, StudyError> {
        self.ensure_initialized()?;
        let rows = self.store.conn().execute(
            "UPDATE review_stats SET wrong = wrong - 1, correct = correct + 1 \
             WHERE id = 1 AND wrong > 0",
            [],
        )?;
        Ok(rows > 0)
    }

    pub fn read(&self) -> Result<ReviewStats, StudyError> {
        self.ensure_initialized()?;
        let stats = self.store.conn().query_row(
            "SELECT total, correct, wrong FROM review_stats WHERE id = 1",
            [],
            |row| {
                Ok(ReviewStats {
                    total: row.get(0)?,
                    correct: row.get(1)?,
                    wrong: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
