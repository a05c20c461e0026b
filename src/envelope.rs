use std::collections::BTreeMap;

use bytes::Bytes;

use crate::error::ProxyError;
use crate::proxy_request::Headers;
use crate::response_builder::OutboundEnvelope;

pub mod api_gateway;
pub mod local_dev;

/// Transport-neutral view of an inbound call. Both bindings decode into this
/// shape so validation never sees where a request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
  pub method: String,
  pub headers: Headers,
  pub query: BTreeMap<String, String>,
  pub body: Bytes,
}

pub trait EnvelopeAdapter {
  type Inbound;
  type Outbound;

  fn decode(&self, raw: Self::Inbound) -> Result<InboundMessage, ProxyError>;

  fn encode(&self, envelope: OutboundEnvelope) -> Self::Outbound;
}
