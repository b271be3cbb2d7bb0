use wana_kana::ConvertJapanese;

/// Guess-normalization strategy for reading answers, resolved once at
/// startup. `Plain` is the degraded mode that skips kana conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RomajiBackend {
    #[default]
    Kana,
    Plain,
}

impl RomajiBackend {
    /// `kana` and `plain` are recognized; anything else means kana.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "plain" => RomajiBackend::Plain,
            _ => RomajiBackend::Kana,
        }
    }

    /// Normalize a reading guess for comparison against expected readings.
    pub fn to_hiragana(&self, guess: &str) -> String {
        match self {
            RomajiBackend::Kana => guess.trim().to_hiragana(),
            RomajiBackend::Plain => guess.trim().to_lowercase(),
        }
    }
}

/// Collapse runs of whitespace and lowercase for meaning comparison.
pub fn normalize_english(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
