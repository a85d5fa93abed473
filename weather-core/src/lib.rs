//! Client side of a two-endpoint weather service.
//!
//! This crate defines:
//! - Connection handles that bind and unbind the remote endpoints
//! - A synchronous request proxy and a single-flight asynchronous broker
//! - The client facade that owns both and reports to a result sink
//! - The wire decoder that turns the service's JSON into typed reports
//! - Configuration, and the endpoints the CLI binds to
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod broker;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod model;
pub mod provider;
pub mod remote;
pub mod sink;
pub mod sync_proxy;
pub mod wire;

pub use client::{WeatherClient, no_data_message};
pub use config::{ClientConfig, Config, ProviderConfig};
pub use connection::{Binder, ConnectionHandle, ConnectionLink};
pub use error::{
    ClientError, DecodeError, DecodeErrorKind, Rejection, RequestError, TransportError,
};
pub use model::{Condition, MainInfo, SysInfo, WeatherReport, WindInfo};
pub use provider::ProviderId;
pub use remote::{EndpointRole, WeatherCall, WeatherRequest, WeatherResults};
pub use sink::{ChannelSink, Outcome, ResultSink};
pub use wire::{decode_reports, encode_reports};
