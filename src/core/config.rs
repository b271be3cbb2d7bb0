use std::{
    env,
    fs,
    path::PathBuf,
};

const APP_NAME: &str = "kanshu";
const DEFAULT_API_URL: &str = "https://api.wanikani.com/v2";
const DEFAULT_TTL_DAYS: i64 = 1;

/// Directory for the database and cached payloads. Falls back to the current
/// directory when no platform data dir exists.
pub fn app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

/// Environment-sourced settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
    pub cache_ttl_days: i64,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
    pub romaji_backend: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let cache_ttl_days = env::var("CACHE_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TTL_DAYS);

        Config {
            api_token: env::var("WANIKANI_API_TOKEN").unwrap_or_default(),
            api_url: env::var("WANIKANI_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            cache_ttl_days,
            db_path: env::var("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| app_data_dir().join("study.db")),
            media_dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media/audio")),
            romaji_backend: env::var("ROMAJI_BACKEND").unwrap_or_else(|_| "kana".to_string()),
        }
    }

    /// Where the serialized kanji payload lives unless the cache row says
    /// otherwise.
    pub fn cache_payload_path(&self) -> PathBuf {
        app_data_dir().join("wk_cache.json")
    }
}
