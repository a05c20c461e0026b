use bytes::Bytes;
use log::warn;
use url::Url;

use crate::envelope::InboundMessage;
use crate::error::ProxyError;
use crate::proxy_request::{ProxyRequest, RequestDescription, DEFAULT_METHOD};

pub const URL_QUERY_PARAM: &str = "url";

// Describe the hop into the proxy, not the request being relayed.
const CONNECTION_HEADERS: [&str; 4] = ["host", "content-length", "connection", "transfer-encoding"];

/// Turns an inbound message into a forwardable request.
///
/// A `url` query parameter selects the query variant, where method, headers
/// and body are taken from the inbound message itself. Otherwise the body
/// must hold a JSON [`RequestDescription`].
pub fn validate(message: InboundMessage) -> Result<ProxyRequest, ProxyError> {
  let result = match message.query.get(URL_QUERY_PARAM) {
    Some(target) => {
      let target = target.clone();
      from_query(&target, message)
    }
    None => from_body(&message.body),
  };

  if let Err(err) = &result {
    warn!("Rejected inbound request: {} {}", err.message(), err.details().unwrap_or_default());
  }

  result
}

fn from_body(body: &[u8]) -> Result<ProxyRequest, ProxyError> {
  let RequestDescription {
    url,
    method,
    headers,
    body,
  } = serde_json::from_slice(body).map_err(|_| ProxyError::malformed_input())?;

  let url = parse_target(url.as_deref(), "Missing url in request body")?;

  Ok(ProxyRequest::new(
    url,
    normalize_method(method),
    headers.unwrap_or_default(),
    Bytes::from(body.unwrap_or_default()),
  ))
}

fn from_query(target: &str, message: InboundMessage) -> Result<ProxyRequest, ProxyError> {
  let url = parse_target(Some(target), "Missing url query parameter")?;

  let InboundMessage { method, mut headers, body, .. } = message;
  for name in CONNECTION_HEADERS {
    headers.remove(name);
  }

  Ok(ProxyRequest::new(url, normalize_method(Some(method)), headers, body))
}

fn parse_target(target: Option<&str>, missing_message: &str) -> Result<Url, ProxyError> {
  let target = match target {
    Some(value) if !value.is_empty() => value,
    _ => return Err(ProxyError::missing_url(missing_message)),
  };

  let url = Url::parse(target).map_err(|err| ProxyError::invalid_url(err.to_string()))?;

  if !url.has_host() {
    return Err(ProxyError::invalid_url(format!("'{target}' has no host")));
  }

  Ok(url)
}

fn normalize_method(method: Option<String>) -> String {
  match method {
    Some(method) if !method.is_empty() => method,
    _ => DEFAULT_METHOD.to_string(),
  }
}
