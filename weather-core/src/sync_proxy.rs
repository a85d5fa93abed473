use tracing::{debug, warn};

use crate::connection::ConnectionHandle;
use crate::error::RequestError;
use crate::model::WeatherReport;
use crate::remote::WeatherCall;

/// Request/response access to the synchronous endpoint.
///
/// Holds no state besides the handle, so concurrent calls are independent.
pub struct SyncProxy {
    connection: ConnectionHandle<dyn WeatherCall>,
}

impl SyncProxy {
    pub fn new(connection: ConnectionHandle<dyn WeatherCall>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &ConnectionHandle<dyn WeatherCall> {
        &self.connection
    }

    /// First report for `location`, or why there is no answer at all.
    /// `Ok(None)` means the endpoint answered with no reports.
    pub async fn try_call(&self, location: &str) -> Result<Option<WeatherReport>, RequestError> {
        let call = self
            .connection
            .current()
            .ok_or(RequestError::NotConnected(self.connection.role()))?;

        let reports = call.get_current_weather(location).await?;
        debug!(%location, count = reports.len(), "sync weather call answered");

        Ok(reports.into_iter().next())
    }

    /// Like [`SyncProxy::try_call`], with every failure logged and folded into `None`.
    pub async fn call(&self, location: &str) -> Option<WeatherReport> {
        match self.try_call(location).await {
            Ok(report) => report,
            Err(err) => {
                warn!(%location, error = %err, "sync weather call failed");
                None
            }
        }
    }
}
