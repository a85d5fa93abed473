use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::WeatherReport;

/// Receives the outcome of weather requests.
///
/// `report` is present on success; `message` explains a failure and is
/// empty on success unless the client runs with the legacy message.
pub trait ResultSink: Send + Sync {
    fn display_results(&self, report: Option<WeatherReport>, message: String);
}

/// One delivery made to a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub report: Option<WeatherReport>,
    pub message: String,
}

/// Sink that forwards every delivery onto an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Outcome>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn display_results(&self, report: Option<WeatherReport>, message: String) {
        if self.tx.send(Outcome { report, message }).is_err() {
            warn!("result receiver dropped, discarding weather outcome");
        }
    }
}

/// The sink currently attached to a client, if any.
#[derive(Clone, Default)]
pub(crate) struct SinkSlot(Arc<RwLock<Option<Arc<dyn ResultSink>>>>);

impl SinkSlot {
    pub(crate) fn set(&self, sink: Arc<dyn ResultSink>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    pub(crate) fn clear(&self) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub(crate) fn deliver(&self, report: Option<WeatherReport>, message: String) {
        let sink = self.0.read().unwrap_or_else(PoisonError::into_inner).clone();
        match sink {
            Some(sink) => sink.display_results(report, message),
            None => warn!(%message, "no result sink attached, dropping weather outcome"),
        }
    }
}
