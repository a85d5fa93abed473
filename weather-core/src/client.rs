//! Client facade over both weather endpoints.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::broker::{AsyncBroker, BrokerOptions};
use crate::config::ClientConfig;
use crate::connection::{Binder, ConnectionHandle, Lifecycle};
use crate::error::{ClientError, Rejection, RequestError};
use crate::model::WeatherReport;
use crate::remote::{EndpointRole, WeatherCall, WeatherRequest};
use crate::sink::{ResultSink, SinkSlot};
use crate::sync_proxy::SyncProxy;

/// Message for a location the service has no weather data for.
pub fn no_data_message(location: &str) -> String {
    format!("no data for location '{location}' found")
}

/// Owns the connections to the sync and async providers and routes
/// requests to them.
pub struct WeatherClient {
    sync: SyncProxy,
    broker: AsyncBroker,
    sink: SinkSlot,
}

impl WeatherClient {
    /// Must be called from inside a Tokio runtime, which then runs the
    /// async deliveries.
    pub fn new(
        config: ClientConfig,
        sync_binder: Arc<dyn Binder<dyn WeatherCall>>,
        async_binder: Arc<dyn Binder<dyn WeatherRequest>>,
    ) -> Result<Self, ClientError> {
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        let sink = SinkSlot::default();

        let sync = SyncProxy::new(ConnectionHandle::new(
            EndpointRole::SyncProvider,
            sync_binder,
        ));
        let broker = AsyncBroker::new(
            ConnectionHandle::new(EndpointRole::AsyncProvider, async_binder),
            sink.clone(),
            runtime,
            BrokerOptions {
                timeout: config.async_timeout,
                legacy_success_message: config.legacy_success_message,
            },
        );

        Ok(Self { sync, broker, sink })
    }

    fn connections(&self) -> [&dyn Lifecycle; 2] {
        [self.sync.connection(), self.broker.connection()]
    }

    /// Record the sink for async outcomes and bind both endpoints.
    pub fn on_attach(&self, sink: Arc<dyn ResultSink>) {
        self.sink.set(sink);
        for connection in self.connections() {
            connection.bind();
        }
    }

    /// Tear down. A transient detach (the owner reattaches right away)
    /// keeps bindings, sink and any outstanding request.
    pub fn on_detach(&self, is_transient: bool) {
        if is_transient {
            debug!("transient detach, keeping endpoint bindings");
            return;
        }

        info!("detaching weather client");
        for connection in self.connections() {
            connection.unbind();
        }
        self.sink.clear();
    }

    pub fn is_connected(&self, role: EndpointRole) -> bool {
        self.connections()
            .iter()
            .any(|connection| connection.role() == role && connection.is_connected())
    }

    /// Wait until both endpoints are connected. Returns `false` on timeout.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let both = async {
            tokio::join!(
                self.sync.connection().wait_connected(),
                self.broker.connection().wait_connected(),
            )
        };
        tokio::time::timeout(timeout, both).await.is_ok()
    }

    pub fn pending_location(&self) -> Option<String> {
        self.broker.pending_location()
    }

    pub async fn get_weather_sync(&self, location: &str) -> Option<WeatherReport> {
        self.sync.call(location).await
    }

    pub async fn try_get_weather_sync(
        &self,
        location: &str,
    ) -> Result<Option<WeatherReport>, RequestError> {
        self.sync.try_call(location).await
    }

    /// Whether the request was accepted; the outcome goes to the sink.
    pub fn get_weather_async(&self, location: &str) -> bool {
        self.broker.request(location)
    }

    pub fn try_get_weather_async(&self, location: &str) -> Result<(), Rejection> {
        self.broker.try_request(location)
    }
}
