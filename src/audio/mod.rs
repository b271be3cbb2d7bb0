use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::OnceLock,
};

use log::info;
use regex::Regex;
use reqwest::blocking::Client;

use crate::core::{
    http::ensure_success,
    StudyError,
};

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const TTS_LANG: &str = "ja";

/// Replace anything outside `\w` and `-` so the text can name an mp3 file.
/// `\w` is unicode-aware, so kana and kanji pass through.
pub fn safe_file_stem(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^\w\-]+").unwrap());
    re.replace_all(text, "_").to_string()
}

/// Synthesize speech for `text` once and cache it under `media_dir`.
/// Existing files are reused without a remote call.
pub fn ensure_audio(client: &Client, media_dir: &Path, text: &str) -> Result<PathBuf, StudyError> {
    fs::create_dir_all(media_dir)?;
    let out = media_dir.join(format!("{}.mp3", safe_file_stem(text)));
    if out.exists() {
        return Ok(out);
    }

    let resp = client
        .get(TTS_URL)
        .query(&[("ie", "UTF-8"), ("client", "tw-ob"), ("tl", TTS_LANG), ("q", text)])
        .send()?;
    ensure_success(&resp)?;
    let bytes = resp.bytes()?;
    fs::write(&out, &bytes)?;
    info!("synthesized audio for {text:?} at {}", out.display());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::http_client;

    #[test]
    fn file_stems_are_filesystem_safe() {
        assert_eq!(safe_file_stem("犬"), "犬");
        assert_eq!(safe_file_stem("お早う ござい ます"), "お早う_ござい_ます");
        assert_eq!(safe_file_stem("a/b\\c:d"), "a_b_c_d");
        assert_eq!(safe_file_stem("half-width"), "half-width");
    }

    #[test]
    fn existing_audio_is_reused_without_a_fetch() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let cached = dir.path().join(format!("{}.mp3", safe_file_stem("犬")));
        fs::write(&cached, b"mp3 bytes").expect("seed");

        let client = http_client().expect("client");
        let path = ensure_audio(&client, dir.path(), "犬").expect("ensure");
        assert_eq!(path, cached);
        assert_eq!(fs::read(&path).expect("read"), b"mp3 bytes");
    }
}
