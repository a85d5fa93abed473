//! Remote endpoints the client can be bound to.

use crate::{Config, provider::openweather::OpenWeatherEndpoint};
use std::{convert::TryFrom, sync::Arc};

pub mod local;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather."
            )),
        }
    }
}

/// Construct the endpoint for `id` from config.
pub fn endpoint_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<OpenWeatherEndpoint>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
        )
    })?;

    let endpoint = match id {
        ProviderId::OpenWeather => OpenWeatherEndpoint::new(api_key.to_owned()),
    };

    Ok(Arc::new(endpoint))
}

/// Construct the endpoint of the `default_provider` from config.
pub fn default_endpoint_from_config(config: &Config) -> anyhow::Result<Arc<OpenWeatherEndpoint>> {
    let id = config.default_provider_id()?;
    endpoint_from_config(id, config)
}
