use thiserror::Error;

pub mod types;
pub mod utils;
pub mod env;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub mod fetch {
    use serde::de::DeserializeOwned;

    use super::*;

    /// GET `url` with a shared client and decode the JSON body.
    /// Non-success statuses surface as `CoreError::Network`.
    pub async fn fetch_json<T: DeserializeOwned>(
        client: &reqwest::Client,
        url: &str,
    ) -> Result<T, CoreError> {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| CoreError::Network(e.to_string()))?;
        let json = resp
            .json::<T>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))?;
        Ok(json)
    }
}
