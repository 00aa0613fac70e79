//! Calendar Lambda - Handles the /calendar endpoints.
//!
//! Endpoints:
//! - POST /calendar - Create a public calendar for a user
//! - POST /calendar/events - Create an event
//! - POST /calendar/clear - Delete all events on a calendar
//! - POST /calendar/check - Check whether a calendar exists

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::{CalendarGateway, GatewayConfig, GoogleConnector};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn handler(
    gateway: Arc<CalendarGateway<GoogleConnector>>,
    event: Request,
) -> Result<Response<Body>, Error> {
    let path = event.uri().path();
    let method = event.method().as_str();

    info!("{} {}", method, path);

    gateway
        .handle(method, path, event.body().as_ref())
        .await
        .into_response(&gateway.config().cors_allow_origin)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = GatewayConfig::from_env();
    if config.credentials.is_none() {
        warn!("GOOGLE_CLIENT_EMAIL or GOOGLE_PRIVATE_KEY not set; calendar requests will fail");
    }

    let connector = GoogleConnector::from_config(&config);
    let gateway = Arc::new(CalendarGateway::new(config, connector));

    run(service_fn(move |event| {
        let gateway = Arc::clone(&gateway);
        async move { handler(gateway, event).await }
    }))
    .await
}
