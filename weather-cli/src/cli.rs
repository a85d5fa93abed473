use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use tokio::{io::AsyncReadExt, sync::mpsc};
use tracing::debug;
use weather_core::{
    ChannelSink, Config, Outcome, ProviderId, WeatherCall, WeatherClient, WeatherReport,
    WeatherRequest, decode_reports, no_data_message,
    provider::{self, local::LocalBinder},
};

use crate::display;

/// How long `show` waits for the weather endpoints to come up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather service client")]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather".
        provider: String,
    },

    /// Show current weather for a location.
    Show {
        /// Location name, e.g. "Nashville" or "Zurich,CH".
        location: String,

        /// Go through the asynchronous endpoint instead of a direct call.
        #[arg(long = "async")]
        use_async: bool,

        /// Print the report as a wire document.
        #[arg(long)]
        json: bool,
    },

    /// Decode a stored weather document and print its reports.
    Decode {
        /// Document to read; standard input if absent.
        file: Option<PathBuf>,

        /// Print the reports as a wire document.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show {
                location,
                use_async,
                json,
            } => show(&location, use_async, json).await,
            Command::Decode { file, json } => decode(file, json).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if config.is_provider_configured(id) {
        let replace = Confirm::new(&format!(
            "An API key for '{id}' is already stored. Replace it?"
        ))
        .with_default(false)
        .prompt()?;

        if !replace {
            println!("Keeping the existing key for {id}.");
            return Ok(());
        }
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_owned());
    config.save()?;

    println!(
        "Saved credentials for {id} to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn show(location: &str, use_async: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let endpoint = provider::default_endpoint_from_config(&config)?;

    let call: Arc<dyn WeatherCall> = endpoint.clone();
    let request: Arc<dyn WeatherRequest> = endpoint;
    let client = WeatherClient::new(
        config.client_config(),
        Arc::new(LocalBinder::new(call)),
        Arc::new(LocalBinder::new(request)),
    )?;

    let (sink, mut outcomes) = ChannelSink::new();
    client.on_attach(Arc::new(sink));

    if !client.wait_connected(CONNECT_TIMEOUT).await {
        client.on_detach(false);
        bail!("weather service did not connect within {CONNECT_TIMEOUT:?}");
    }

    debug!(%location, use_async, "fetching current weather");
    let result = if use_async {
        fetch_async(&client, &mut outcomes, location).await
    } else {
        fetch_sync(&client, location).await
    };
    client.on_detach(false);

    display::print_reports(&[result?], json)
}

async fn fetch_sync(client: &WeatherClient, location: &str) -> anyhow::Result<WeatherReport> {
    client
        .try_get_weather_sync(location)
        .await?
        .ok_or_else(|| anyhow!(no_data_message(location)))
}

async fn fetch_async(
    client: &WeatherClient,
    outcomes: &mut mpsc::UnboundedReceiver<Outcome>,
    location: &str,
) -> anyhow::Result<WeatherReport> {
    client.try_get_weather_async(location)?;

    let outcome = outcomes
        .recv()
        .await
        .context("Result sink closed before an answer arrived")?;

    match outcome.report {
        Some(report) => Ok(report),
        None => bail!("{}", outcome.message),
    }
}

async fn decode(file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read document: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read document from stdin")?;
            buf
        }
    };

    let reports = decode_reports(&text).context("Failed to decode weather document")?;
    if reports.is_empty() && !json {
        println!("No weather reports in document.");
        return Ok(());
    }

    display::print_reports(&reports, json)
}
