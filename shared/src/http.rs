//! HTTP helpers for the Lambda entrypoint.

use lambda_http::{Body, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";

/// Transport-independent response produced by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    /// `None` for empty bodies (CORS preflight)
    pub body: Option<Value>,
}

impl GatewayResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    /// Convert into a Lambda response carrying the CORS header set.
    pub fn into_response(
        self,
        allow_origin: &str,
    ) -> std::result::Result<Response<Body>, lambda_http::Error> {
        match self.body {
            Some(body) => json_response(self.status, &body, allow_origin),
            None => Ok(cors_builder(self.status, allow_origin).body(Body::Empty)?),
        }
    }
}

fn cors_builder(status: u16, allow_origin: &str) -> lambda_http::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", allow_origin)
        .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    data: &T,
    allow_origin: &str,
) -> std::result::Result<Response<Body>, lambda_http::Error> {
    let json = serde_json::to_string(data)?;
    Ok(cors_builder(status, allow_origin)
        .header("Content-Type", "application/json")
        .body(Body::from(json))?)
}

/// Parse a request body as JSON; malformed or missing bodies are `InvalidBody` errors.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::InvalidBody("request body is required".to_string()));
    }

    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidBody(e.to_string()))
}
