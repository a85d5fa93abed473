//! Call contracts of the two remote weather endpoints.
//!
//! The synchronous endpoint answers a call directly. The asynchronous one
//! accepts a request and answers later through a [`WeatherResults`]
//! callback, which is a one-shot message channel back to the caller.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::TransportError;
use crate::model::WeatherReport;

/// Role a remote endpoint plays for the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    SyncProvider,
    AsyncProvider,
}

impl EndpointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::SyncProvider => "sync weather provider",
            EndpointRole::AsyncProvider => "async weather provider",
        }
    }

    pub const fn all() -> &'static [EndpointRole] {
        &[EndpointRole::SyncProvider, EndpointRole::AsyncProvider]
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response interface of the synchronous endpoint.
#[async_trait]
pub trait WeatherCall: Send + Sync + Debug {
    async fn get_current_weather(
        &self,
        location: &str,
    ) -> Result<Vec<WeatherReport>, TransportError>;
}

/// Fire-and-forget interface of the asynchronous endpoint.
///
/// Returning `Ok` commits the endpoint to answer through `results`
/// exactly once; dropping `results` unanswered counts as an error.
pub trait WeatherRequest: Send + Sync + Debug {
    fn get_current_weather(
        &self,
        location: &str,
        results: WeatherResults,
    ) -> Result<(), TransportError>;
}

/// What the asynchronous endpoint sent back.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Results(WeatherReport),
    Error(String),
}

/// Callback handed to [`WeatherRequest::get_current_weather`].
#[derive(Debug)]
pub struct WeatherResults {
    tx: oneshot::Sender<Delivery>,
}

impl WeatherResults {
    pub fn channel() -> (Self, oneshot::Receiver<Delivery>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn send_results(self, report: WeatherReport) {
        self.send(Delivery::Results(report));
    }

    pub fn send_error(self, reason: impl Into<String>) {
        self.send(Delivery::Error(reason.into()));
    }

    fn send(self, delivery: Delivery) {
        if self.tx.send(delivery).is_err() {
            debug!("weather results arrived after the request was abandoned");
        }
    }
}
