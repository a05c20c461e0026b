use crate::config::Config;
use crate::envelope::{EnvelopeAdapter, InboundMessage};
use crate::forwarder::Forwarder;
use crate::http_client::HttpClientConfig;
use crate::response_builder::{self, OutboundEnvelope};
use crate::validator;

/// decode -> validate -> forward -> build -> encode, once per invocation.
/// Holds nothing request-scoped, so one instance serves every binding.
#[derive(Debug, Clone)]
pub struct Pipeline {
  forwarder: Forwarder,
}

impl Pipeline {
  pub fn new(forwarder: Forwarder) -> Self {
    Self { forwarder }
  }

  pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
    let http_client = HttpClientConfig::from(config).to_client()?;
    Ok(Self::new(Forwarder::new(http_client)))
  }

  pub async fn handle(&self, message: InboundMessage) -> OutboundEnvelope {
    let outcome = match validator::validate(message) {
      Ok(request) => self.forwarder.forward(&request).await,
      Err(err) => Err(err),
    };

    response_builder::build(outcome)
  }

  pub async fn dispatch<A: EnvelopeAdapter>(&self, adapter: &A, raw: A::Inbound) -> A::Outbound {
    let envelope = match adapter.decode(raw) {
      Ok(message) => self.handle(message).await,
      Err(err) => response_builder::error_envelope(&err),
    };

    adapter.encode(envelope)
  }
}
