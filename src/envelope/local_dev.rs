use actix_web::error::PayloadError;
use actix_web::http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use log::{debug, warn};

use crate::envelope::{EnvelopeAdapter, InboundMessage};
use crate::error::ProxyError;
use crate::pipeline::Pipeline;
use crate::proxy_request::Headers;
use crate::response_builder::{self, OutboundEnvelope};

pub const LOCAL_DEV_PATH: &str = "/lambda";

/// Maps a plain actix-web request onto the same message the cloud binding
/// produces. Repeated headers and query parameters keep their first value.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDevAdapter;

impl EnvelopeAdapter for LocalDevAdapter {
  type Inbound = (HttpRequest, Bytes);
  type Outbound = HttpResponse;

  fn decode(&self, (request, body): (HttpRequest, Bytes)) -> Result<InboundMessage, ProxyError> {
    let mut headers = Headers::new();
    for (name, value) in request.headers().iter() {
      headers.insert_if_absent(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }

    let mut message = InboundMessage {
      method: request.method().as_str().to_string(),
      headers,
      body,
      ..InboundMessage::default()
    };

    for (name, value) in url::form_urlencoded::parse(request.query_string().as_bytes()) {
      message.query.entry(name.into_owned()).or_insert_with(|| value.into_owned());
    }

    Ok(message)
  }

  fn encode(&self, envelope: OutboundEnvelope) -> HttpResponse {
    let status = StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = HttpResponse::build(status);

    for (name, value) in envelope.headers.iter() {
      let header = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value));
      match header {
        // The body is re-framed here, actix sets its own framing headers.
        (Ok(name), _) if name == CONTENT_LENGTH || name == TRANSFER_ENCODING => {}
        (Ok(name), Ok(value)) => {
          response.insert_header((name, value));
        }
        _ => warn!("Dropping unrepresentable response header '{}'", name),
      }
    }

    response.body(envelope.body)
  }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg.route(LOCAL_DEV_PATH, web::route().to(handle));
}

pub async fn handle(request: HttpRequest, payload: web::Payload, pipeline: web::Data<Pipeline>) -> HttpResponse {
  let body = match read_payload(payload).await {
    Ok(body) => body,
    Err(err) => {
      warn!("Reading request body failed {}", err);
      let envelope = response_builder::error_envelope(&ProxyError::unreadable_request_body(err.to_string()));
      return LocalDevAdapter.encode(envelope);
    }
  };

  debug!("{} {} with {} byte body", request.method(), request.uri(), body.len());
  pipeline.dispatch(&LocalDevAdapter, (request, body)).await
}

async fn read_payload(mut payload: web::Payload) -> Result<Bytes, PayloadError> {
  let mut body_buffer = BytesMut::new();

  while let Some(chunk) = payload.next().await {
    body_buffer.extend_from_slice(&chunk?);
  }

  Ok(body_buffer.freeze())
}
