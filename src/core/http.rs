use std::time::Duration;

use reqwest::blocking::{
    Client,
    Response,
};

use crate::core::StudyError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<Client, StudyError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| StudyError::Custom(format!("HTTP client build failed: {e}")))
}

pub fn ensure_success(resp: &Response) -> Result<(), StudyError> {
    if !resp.status().is_success() {
        return Err(StudyError::HttpStatus {
            status: resp.status(),
            url: resp.url().to_string(),
        });
    }
    Ok(())
}
