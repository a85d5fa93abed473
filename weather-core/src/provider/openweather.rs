use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::runtime::Handle;
use tracing::debug;

use crate::client::no_data_message;
use crate::error::TransportError;
use crate::model::WeatherReport;
use crate::remote::{WeatherCall, WeatherRequest, WeatherResults};
use crate::wire::decode_reports;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Endpoint backed by the OpenWeather current-weather API.
///
/// Serves both roles: answering calls directly, and answering requests
/// from a spawned task through the results callback.
#[derive(Debug, Clone)]
pub struct OpenWeatherEndpoint {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherEndpoint {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Fetch and decode the current weather for `location`. An unknown
    /// location yields no reports rather than an error.
    pub async fn fetch(&self, location: &str) -> Result<Vec<WeatherReport>, TransportError> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                TransportError::Upstream(format!("Failed to send request to OpenWeather: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            TransportError::Upstream(format!("Failed to read OpenWeather response body: {e}"))
        })?;

        if status == StatusCode::NOT_FOUND {
            debug!(%location, "OpenWeather does not know this location");
            return Ok(Vec::new());
        }

        if !status.is_success() {
            return Err(TransportError::Upstream(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        Ok(decode_reports(&body)?)
    }
}

#[async_trait]
impl WeatherCall for OpenWeatherEndpoint {
    async fn get_current_weather(
        &self,
        location: &str,
    ) -> Result<Vec<WeatherReport>, TransportError> {
        self.fetch(location).await
    }
}

impl WeatherRequest for OpenWeatherEndpoint {
    fn get_current_weather(
        &self,
        location: &str,
        results: WeatherResults,
    ) -> Result<(), TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Unavailable(format!("no runtime to serve requests: {e}")))?;

        let endpoint = self.clone();
        let location = location.to_owned();
        runtime.spawn(async move {
            match endpoint.fetch(&location).await {
                Ok(reports) => match reports.into_iter().next() {
                    Some(report) => results.send_results(report),
                    None => results.send_error(no_data_message(&location)),
                },
                Err(err) => results.send_error(err.to_string()),
            }
        });

        Ok(())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
