use serde::Serialize;
use serde_json::json;

use crate::error::ProxyError;
use crate::proxy_request::{Headers, ProxyResponse};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Transport-neutral response produced once per invocation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
  pub status_code: u16,
  pub headers: Headers,
  pub body: String,
}

/// Upstream replies pass through untouched: status, headers and body as
/// received. Failures become a JSON error body.
pub fn build(outcome: Result<ProxyResponse, ProxyError>) -> OutboundEnvelope {
  match outcome {
    Ok(ProxyResponse { status_code, headers, body }) => OutboundEnvelope {
      status_code,
      headers,
      body,
    },
    Err(err) => error_envelope(&err),
  }
}

pub fn error_envelope(err: &ProxyError) -> OutboundEnvelope {
  let mut body = json!({ "error": err.message() });
  if let Some(details) = err.details() {
    body["details"] = json!(details);
  }

  let mut headers = Headers::new();
  headers.insert("Content-Type", CONTENT_TYPE_JSON);

  OutboundEnvelope {
    status_code: err.status_code(),
    headers,
    body: body.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use serde_json::Value;

  use super::*;
  use crate::error::ProxyErrorKind;

  #[test]
  fn upstream_response_is_relayed_verbatim() {
    let mut headers = Headers::new();
    headers.insert("content-type", "text/html");
    headers.insert("x-upstream", "1");

    let envelope = build(Ok(ProxyResponse {
      status_code: 418,
      headers: headers.clone(),
      body: "<p>teapot</p>".to_string(),
    }));

    assert_eq!(envelope.status_code, 418);
    assert_eq!(envelope.headers, headers);
    assert_eq!(envelope.body, "<p>teapot</p>");
  }

  #[test]
  fn error_status_follows_kind() {
    assert_eq!(build(Err(ProxyError::malformed_input())).status_code, 400);
    assert_eq!(build(Err(ProxyError::missing_url("Missing url in request body"))).status_code, 400);
    assert_eq!(build(Err(ProxyError::invalid_url("x"))).status_code, 400);
    assert_eq!(build(Err(ProxyError::request_build("x"))).status_code, 400);
    assert_eq!(build(Err(ProxyError::upstream("x"))).status_code, 500);
    assert_eq!(build(Err(ProxyError::body_read("x"))).status_code, 500);
  }

  #[test]
  fn error_body_carries_json_content_type() {
    let envelope = build(Err(ProxyError::malformed_input()));

    assert_eq!(envelope.headers.get("content-type"), Some(CONTENT_TYPE_JSON));
    assert_eq!(envelope.body, r#"{"error":"Invalid request body format"}"#);
  }

  #[test]
  fn error_text_is_escaped() {
    let err = ProxyError::new(ProxyErrorKind::UpstreamFailure, "quote \" and \\ slash")
      .with_details("line one\nline \"two\"");

    let envelope = error_envelope(&err);
    let parsed: Value = serde_json::from_str(&envelope.body).unwrap();

    assert_eq!(parsed["error"], "quote \" and \\ slash");
    assert_eq!(parsed["details"], "line one\nline \"two\"");
  }

  #[test]
  fn details_are_omitted_when_absent() {
    let parsed: Value = serde_json::from_str(&error_envelope(&ProxyError::missing_url("Missing url in request body")).body).unwrap();

    assert_eq!(parsed["error"], "Missing url in request body");
    assert!(parsed.get("details").is_none());
  }
}
