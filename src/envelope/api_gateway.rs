use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::envelope::{EnvelopeAdapter, InboundMessage};
use crate::error::ProxyError;
use crate::proxy_request::Headers;
use crate::response_builder::OutboundEnvelope;

/// API Gateway REST proxy integration event. Fields the proxy does not read
/// (request context, stage variables, ...) are ignored.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyRequest {
  pub http_method: Option<String>,
  pub path: Option<String>,
  pub headers: Option<BTreeMap<String, String>>,
  pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
  pub query_string_parameters: Option<BTreeMap<String, String>>,
  pub multi_value_query_string_parameters: Option<BTreeMap<String, Vec<String>>>,
  pub body: Option<String>,
  #[serde(default)]
  pub is_base64_encoded: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyResponse {
  pub status_code: u16,
  pub headers: Headers,
  pub body: String,
  pub is_base64_encoded: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ApiGatewayAdapter;

impl EnvelopeAdapter for ApiGatewayAdapter {
  type Inbound = ApiGatewayProxyRequest;
  type Outbound = ApiGatewayProxyResponse;

  fn decode(&self, raw: ApiGatewayProxyRequest) -> Result<InboundMessage, ProxyError> {
    let ApiGatewayProxyRequest {
      http_method,
      headers,
      multi_value_headers,
      query_string_parameters,
      multi_value_query_string_parameters,
      body,
      is_base64_encoded,
      ..
    } = raw;

    let mut message_headers = Headers::new();
    for (name, value) in headers.into_iter().flatten() {
      message_headers.insert(name, value);
    }
    for (name, values) in multi_value_headers.into_iter().flatten() {
      if let Some(first) = values.into_iter().next() {
        message_headers.insert_if_absent(name, first);
      }
    }

    let mut query = query_string_parameters.unwrap_or_default();
    for (name, values) in multi_value_query_string_parameters.into_iter().flatten() {
      if let Some(first) = values.into_iter().next() {
        query.entry(name).or_insert(first);
      }
    }

    let body = match body {
      Some(encoded) if is_base64_encoded => STANDARD
        .decode(encoded.as_bytes())
        .map(Bytes::from)
        .map_err(|err| ProxyError::malformed_input().with_details(err.to_string()))?,
      Some(text) => Bytes::from(text),
      None => Bytes::new(),
    };

    Ok(InboundMessage {
      method: http_method.unwrap_or_default(),
      headers: message_headers,
      query,
      body,
    })
  }

  fn encode(&self, envelope: OutboundEnvelope) -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
      status_code: envelope.status_code,
      headers: envelope.headers,
      body: envelope.body,
      is_base64_encoded: false,
    }
  }
}
