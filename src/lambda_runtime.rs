use std::env;

use bytes::Bytes;
use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::Config;
use crate::envelope::api_gateway::{ApiGatewayAdapter, ApiGatewayProxyRequest};
use crate::error::RuntimeError;
use crate::pipeline::Pipeline;

const RUNTIME_API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const TRACE_ID_HEADER: &str = "lambda-runtime-trace-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ERROR_TYPE_HEADER: &str = "lambda-runtime-function-error-type";

pub const TRACE_ID_ENV: &str = "_X_AMZN_TRACE_ID";

#[derive(Debug, Clone)]
pub struct Invocation {
  pub request_id: String,
  pub trace_id: Option<String>,
  /// Wall-clock deadline in epoch milliseconds.
  pub deadline_ms: Option<u64>,
  pub payload: Bytes,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ErrorReport<'a> {
  error_message: &'a str,
  error_type: &'a str,
}

/// Client for the host's Lambda Runtime API.
///
/// `invocation/next` long-polls until the host has an event, so this client
/// has no timeout and never goes through an outbound proxy.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
  http_client: Client,
  base_url: String,
}

impl RuntimeClient {
  pub fn new(runtime_api: &str) -> Result<Self, RuntimeError> {
    let http_client = reqwest::ClientBuilder::new().no_proxy().build()?;

    Ok(Self {
      http_client,
      base_url: format!("http://{runtime_api}/{RUNTIME_API_VERSION}/runtime"),
    })
  }

  pub fn from_config(config: &Config) -> Result<Self, RuntimeError> {
    let runtime_api = config.runtime_api
      .as_deref()
      .filter(|value| !value.is_empty())
      .ok_or(RuntimeError::MissingRuntimeApi)?;
    Self::new(runtime_api)
  }

  pub async fn next_invocation(&self) -> Result<Invocation, RuntimeError> {
    let response = self.http_client
      .get(format!("{}/invocation/next", self.base_url))
      .send()
      .await?;
    ensure_success(response.status())?;

    let headers = response.headers();
    let header_text = |name: &str| headers
      .get(name)
      .and_then(|value| value.to_str().ok())
      .map(str::to_string);

    let request_id = header_text(REQUEST_ID_HEADER).ok_or(RuntimeError::MissingRequestId)?;
    let trace_id = header_text(TRACE_ID_HEADER);
    let deadline_ms = header_text(DEADLINE_HEADER).and_then(|value| value.parse().ok());

    let payload = response.bytes().await?;

    Ok(Invocation {
      request_id,
      trace_id,
      deadline_ms,
      payload,
    })
  }

  pub async fn send_response(&self, request_id: &str, body: Vec<u8>) -> Result<(), RuntimeError> {
    let response = self.http_client
      .post(format!("{}/invocation/{request_id}/response", self.base_url))
      .header(CONTENT_TYPE, "application/json")
      .body(body)
      .send()
      .await?;

    ensure_success(response.status())
  }

  pub async fn send_error(&self, request_id: &str, error_type: &str, message: &str) -> Result<(), RuntimeError> {
    self.post_error(format!("{}/invocation/{request_id}/error", self.base_url), error_type, message).await
  }

  /// Reports a failure that happened before the first invocation was polled.
  /// The host treats the whole environment as failed.
  pub async fn send_init_error(&self, error_type: &str, message: &str) -> Result<(), RuntimeError> {
    self.post_error(format!("{}/init/error", self.base_url), error_type, message).await
  }

  async fn post_error(&self, endpoint: String, error_type: &str, message: &str) -> Result<(), RuntimeError> {
    let report = serde_json::to_vec(&ErrorReport {
      error_message: message,
      error_type,
    })?;

    let response = self.http_client
      .post(endpoint)
      .header(CONTENT_TYPE, "application/json")
      .header(FUNCTION_ERROR_TYPE_HEADER, "Unhandled")
      .body(report)
      .send()
      .await?;

    ensure_success(response.status())
  }
}

fn ensure_success(status: StatusCode) -> Result<(), RuntimeError> {
  if status.is_success() {
    Ok(())
  } else {
    Err(RuntimeError::UnexpectedStatus(status.as_u16()))
  }
}

/// Handles one invocation end to end. Events that are not gateway events and
/// responses that cannot be serialized go to the host's error endpoint.
pub async fn process_next(client: &RuntimeClient, pipeline: &Pipeline) -> Result<(), RuntimeError> {
  let Invocation {
    request_id,
    trace_id,
    deadline_ms,
    payload,
  } = client.next_invocation().await?;

  // Instrumented SDKs read the active trace from the process environment.
  match trace_id {
    Some(trace_id) => env::set_var(TRACE_ID_ENV, trace_id),
    None => env::remove_var(TRACE_ID_ENV),
  }
  debug!("Invocation {} deadline {:?}", request_id, deadline_ms);

  let event: ApiGatewayProxyRequest = match serde_json::from_slice(&payload) {
    Ok(event) => event,
    Err(err) => {
      error!("Invocation {} carried an unreadable event {}", request_id, err);
      return client.send_error(&request_id, "InvalidEvent", &err.to_string()).await;
    }
  };

  let response = pipeline.dispatch(&ApiGatewayAdapter, event).await;

  match serde_json::to_vec(&response) {
    Ok(body) => client.send_response(&request_id, body).await,
    Err(err) => {
      error!("Serializing response for invocation {} failed {}", request_id, err);
      client.send_error(&request_id, "SerializationError", &err.to_string()).await
    }
  }
}

/// Serves invocations one at a time until the runtime API becomes unusable.
pub async fn run(client: &RuntimeClient, pipeline: &Pipeline) -> Result<(), RuntimeError> {
  info!("Polling runtime api at {}", client.base_url);

  loop {
    if let Err(err) = process_next(client, pipeline).await {
      error!("Runtime api failure {}", err);
      return Err(err);
    }
  }
}
