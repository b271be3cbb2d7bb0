use rand::Rng;

use crate::{
    core::{
        KanjiItem,
        ReadingKind,
        StudyError,
    },
    scoring::ScoringService,
};

pub mod normalize;

pub use normalize::{
    normalize_english,
    RomajiBackend,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
    Onyomi,
    Kunyomi,
    Meaning,
}

impl QuizMode {
    fn reading_kind(&self) -> Option<ReadingKind> {
        match self {
            QuizMode::Onyomi => Some(ReadingKind::Onyomi),
            QuizMode::Kunyomi => Some(ReadingKind::Kunyomi),
            QuizMode::Meaning => None,
        }
    }
}

/// Answers accepted for an item in the given mode.
pub fn expected_answers(item: &KanjiItem, mode: QuizMode) -> Vec<String> {
    match mode.reading_kind() {
        None => item.meanings.iter().map(|m| m.to_lowercase()).collect(),
        Some(kind) => item.readings_of_kind(&kind).map(|r| r.reading.clone()).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub correct: bool,
    pub expected: Vec<String>,
}

/// Compare a free-text guess against an item's expected answers. Reading
/// modes run the guess through the romanization backend; meaning mode
/// compares whitespace-collapsed lowercase on both sides.
pub fn check_answer(
    item: &KanjiItem,
    mode: QuizMode,
    guess: &str,
    backend: RomajiBackend,
) -> Outcome {
    let expected = expected_answers(item, mode);
    let correct = match mode {
        QuizMode::Meaning => {
            let guess = normalize_english(guess);
            expected.iter().any(|answer| normalize_english(answer) == guess)
        }
        QuizMode::Onyomi | QuizMode::Kunyomi => {
            let guess = backend.to_hiragana(guess);
            expected.iter().any(|answer| *answer == guess)
        }
    };
    Outcome { correct, expected }
}

/// One practice run over a loaded dataset: draw a random prompt, take a
/// guess, count it, allow typo forgiveness on the last wrong answer.
pub struct QuizSession<'a> {
    items: Vec<KanjiItem>,
    mode: QuizMode,
    backend: RomajiBackend,
    scoring: ScoringService<'a>,
    current: Option<usize>,
    undo_stack: Vec<(u64, bool)>,
}

impl<'a> QuizSession<'a> {
    pub fn new(
        items: Vec<KanjiItem>,
        mode: QuizMode,
        backend: RomajiBackend,
        scoring: ScoringService<'a>,
    ) -> Self {
        Self { items, mode, backend, scoring, current: None, undo_stack: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pick a random item as the current prompt.
    pub fn draw(&mut self) -> Option<&KanjiItem> {
        if self.items.is_empty() {
            self.current = None;
            return None;
        }
        let idx = rand::rng().random_range(0..self.items.len());
        self.current = Some(idx);
        self.items.get(idx)
    }

    pub fn current(&self) -> Option<&KanjiItem> {
        self.current.and_then(|idx| self.items.get(idx))
    }

    /// Check the guess against the current prompt and count the outcome.
    /// `None` when nothing has been drawn yet.
    pub fn submit(&mut self, guess: &str) -> Result<Option<Outcome>, StudyError> {
        let Some(item) = self.current() else {
            return Ok(None);
        };
        let outcome = check_answer(item, self.mode, guess, self.backend);
        let item_id = item.id;
        self.scoring.record(outcome.correct)?;
        self.undo_stack.push((item_id, outcome.correct));
        Ok(Some(outcome))
    }

    /// Forgive the most recent answer if it was wrong. A correct answer pops
    /// off the stack without touching the counters.
    pub fn undo_last(&mut self) -> Result<bool, StudyError> {
        match self.undo_stack.pop() {
            Some((_, false)) => self.scoring.undo_last_wrong(),
            Some((_, true)) | None => Ok(false),
        }
    }
}
