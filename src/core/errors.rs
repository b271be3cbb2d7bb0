use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudyError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(Box<rusqlite::Error>),

    #[error("HTTP error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: reqwest::StatusCode, url: String },

    #[error("CSV error: {0}")]
    Csv(Box<csv::Error>),

    #[error("StudyError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for StudyError {
    fn from(error: std::io::Error) -> Self {
        StudyError::Io(Box::new(error))
    }
}

impl From<rusqlite::Error> for StudyError {
    fn from(error: rusqlite::Error) -> Self {
        StudyError::Sqlite(Box::new(error))
    }
}

impl From<reqwest::Error> for StudyError {
    fn from(error: reqwest::Error) -> Self {
        StudyError::Reqwest(Box::new(error))
    }
}

impl From<csv::Error> for StudyError {
    fn from(error: csv::Error) -> Self {
        StudyError::Csv(Box::new(error))
    }
}
