//! Single-flight broker for the asynchronous endpoint.
//!
//! The broker is either idle or waiting on one request. A request is only
//! accepted while idle and connected; a busy broker reports `Busy` even
//! when the endpoint has gone away meanwhile. The answer comes back on a one-shot
//! channel; a task per request waits for it (bounded by the configured
//! timeout), returns the broker to idle and hands the outcome to the sink.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::client::no_data_message;
use crate::connection::ConnectionHandle;
use crate::error::Rejection;
use crate::remote::{Delivery, WeatherRequest, WeatherResults};
use crate::sink::SinkSlot;

/// Location of the outstanding request, if any.
#[derive(Debug, Default)]
struct PendingLocation(Mutex<Option<String>>);

impl PendingLocation {
    /// Claim the broker for `location`. Fails with the location already
    /// outstanding.
    fn try_acquire(&self, location: &str) -> Result<(), String> {
        let mut pending = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = pending.as_ref() {
            return Err(current.clone());
        }
        *pending = Some(location.to_owned());
        Ok(())
    }

    fn release(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn current(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// How deliveries are turned into sink calls.
#[derive(Debug, Clone, Copy)]
pub struct BrokerOptions {
    /// Time after which an unanswered request is abandoned.
    pub timeout: Duration,
    /// Send the historic "no data" message alongside successful results.
    pub legacy_success_message: bool,
}

pub struct AsyncBroker {
    connection: ConnectionHandle<dyn WeatherRequest>,
    pending: Arc<PendingLocation>,
    sink: SinkSlot,
    runtime: Handle,
    options: BrokerOptions,
}

impl AsyncBroker {
    pub(crate) fn new(
        connection: ConnectionHandle<dyn WeatherRequest>,
        sink: SinkSlot,
        runtime: Handle,
        options: BrokerOptions,
    ) -> Self {
        Self {
            connection,
            pending: Arc::default(),
            sink,
            runtime,
            options,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle<dyn WeatherRequest> {
        &self.connection
    }

    /// Location of the request currently outstanding.
    pub fn pending_location(&self) -> Option<String> {
        self.pending.current()
    }

    /// Issue a request for `location`; the outcome goes to the sink.
    pub fn try_request(&self, location: &str) -> Result<(), Rejection> {
        self.pending
            .try_acquire(location)
            .map_err(|pending| Rejection::Busy { pending })?;

        let Some(request) = self.connection.current() else {
            self.pending.release();
            return Err(Rejection::NotConnected(self.connection.role()));
        };

        let (results, delivery) = WeatherResults::channel();
        if let Err(err) = request.get_current_weather(location, results) {
            self.pending.release();
            return Err(Rejection::Transport(err));
        }

        info!(%location, "async weather request accepted");
        self.runtime.spawn(await_delivery(
            location.to_owned(),
            delivery,
            Arc::clone(&self.pending),
            self.sink.clone(),
            self.options,
        ));

        Ok(())
    }

    /// Like [`AsyncBroker::try_request`], reduced to whether it was accepted.
    pub fn request(&self, location: &str) -> bool {
        match self.try_request(location) {
            Ok(()) => true,
            Err(err) => {
                warn!(%location, reason = %err, "async weather request rejected");
                false
            }
        }
    }
}

async fn await_delivery(
    location: String,
    delivery: oneshot::Receiver<Delivery>,
    pending: Arc<PendingLocation>,
    sink: SinkSlot,
    options: BrokerOptions,
) {
    let (report, message) = match tokio::time::timeout(options.timeout, delivery).await {
        Ok(Ok(Delivery::Results(report))) => {
            debug!(%location, "async weather results delivered");
            let message = if options.legacy_success_message {
                no_data_message(&location)
            } else {
                String::new()
            };
            (Some(report), message)
        }
        Ok(Ok(Delivery::Error(reason))) => {
            debug!(%location, %reason, "async weather error delivered");
            (None, reason)
        }
        Ok(Err(_)) => {
            warn!(%location, "weather service abandoned the request");
            (
                None,
                format!("weather service abandoned the request for '{location}'"),
            )
        }
        Err(_) => {
            warn!(%location, timeout = ?options.timeout, "async weather request timed out");
            (
                None,
                format!(
                    "weather request for '{location}' timed out after {:?}",
                    options.timeout
                ),
            )
        }
    };

    pending.release();
    sink.deliver(report, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_location_admits_one_request() {
        let pending = PendingLocation::default();

        assert!(pending.try_acquire("Nashville").is_ok());
        assert_eq!(pending.try_acquire("Memphis"), Err("Nashville".to_string()));
        assert_eq!(pending.current().as_deref(), Some("Nashville"));

        assert_eq!(pending.release().as_deref(), Some("Nashville"));
        assert!(pending.try_acquire("Memphis").is_ok());
    }
}
