use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;
use crate::forecast::RawForecast;

/// Anything that can turn a city's request URL into a forecast payload.
#[async_trait]
pub trait ForecastClient: Send + Sync {
    async fn fetch_forecast(&self, url: &str) -> Result<RawForecast, FetchError>;
}

/// Forecast client backed by a shared reqwest connection pool.
#[derive(Debug, Clone)]
pub struct HttpForecastClient {
    client: Client,
}

impl HttpForecastClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ForecastClient for HttpForecastClient {
    async fn fetch_forecast(&self, url: &str) -> Result<RawForecast, FetchError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        let json: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        if !json.is_object() {
            return Err(FetchError::Decode("top-level value is not an object".into()));
        }

        Ok(RawForecast(json))
    }
}
