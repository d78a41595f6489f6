use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::{TradeReceipt, TradeRequest};

pub const DEFAULT_FAILURE_MESSAGE: &str = "Transaction failed";

/// Why a submission did not produce a signature. `Display` is the message
/// shown to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

impl TradeError {
    pub fn kind(&self) -> &'static str {
        match self {
            TradeError::Validation(_) => "validation",
            TradeError::Api { .. } => "api",
            TradeError::Transport(_) => "transport",
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            TradeError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TradeError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the api key.
        TradeError::Transport(err.without_url().to_string())
    }
}

/// The trading endpoint the desk submits to.
#[async_trait]
pub trait TradeApi: Send + Sync {
    async fn trade(&self, req: &TradeRequest) -> Result<TradeReceipt, TradeError>;
}

#[derive(Clone)]
pub struct PumpPortalClient {
    trade_url: String,
    api_key: String,
    http: Client,
}

impl PumpPortalClient {
    pub fn new(trade_url: String, api_key: String) -> Self {
        Self {
            trade_url,
            api_key,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl TradeApi for PumpPortalClient {
    async fn trade(&self, req: &TradeRequest) -> Result<TradeReceipt, TradeError> {
        let resp = self
            .http
            .post(&self.trade_url)
            .query(&[("api-key", self.api_key.as_str())])
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        // The body is parsed whatever the status; error bodies carry `message`.
        let body: Value = resp.json().await?;
        debug!(status = status.as_u16(), %body, "pumpportal.trade.response");
        interpret_response(status, body)
    }
}

/// Maps an HTTP status and parsed body to a receipt or an error. The status
/// code decides success.
pub fn interpret_response(status: StatusCode, body: Value) -> Result<TradeReceipt, TradeError> {
    if !status.is_success() {
        return Err(TradeError::Api {
            status: status.as_u16(),
            message: body_message(&body),
        });
    }

    match body.get("signature").and_then(Value::as_str) {
        Some(sig) if !sig.is_empty() => Ok(TradeReceipt {
            signature: sig.to_string(),
            raw: body,
        }),
        _ => Err(TradeError::Api {
            status: status.as_u16(),
            message: body_message(&body),
        }),
    }
}

fn body_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
        .to_string()
}
