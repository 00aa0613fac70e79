//! Shared library for the Youredu calendar gateway.
//!
//! This crate provides the configuration, error type, provider port and
//! Google Calendar adapter used by the calendar Lambda function.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod google;
pub mod http;
pub mod models;
pub mod pager;
pub mod provider;

#[cfg(test)]
mod test_support;

pub use config::{GatewayConfig, ServiceCredentials};
pub use error::{Error, Result};
pub use gateway::{CalendarGateway, GatewayError};
pub use google::{GoogleCalendarClient, GoogleConnector};
pub use http::GatewayResponse;
pub use models::{CalendarRequest, CheckRequest, ClearRequest, EventPayload, EventRequest};
pub use provider::{CalendarProvider, ProviderConnector};
