use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};

use crate::error::{error_chain, ProxyError};
use crate::proxy_request::{Headers, ProxyRequest, ProxyResponse};

/// Executes exactly one outbound call per validated request. No retries.
#[derive(Debug, Clone)]
pub struct Forwarder {
  http_client: Client,
}

impl Forwarder {
  pub fn new(http_client: Client) -> Self {
    Self { http_client }
  }

  pub async fn forward(&self, request: &ProxyRequest) -> Result<ProxyResponse, ProxyError> {
    let builder = self.init_request(request)?;

    let upstream_response = builder.send().await.map_err(|err| {
      if err.is_builder() {
        ProxyError::request_build(error_chain(&err))
      } else {
        error!("Proxy request to {} failed {}", request.url(), error_chain(&err));
        ProxyError::upstream(error_chain(&err))
      }
    })?;

    let status_code = upstream_response.status().as_u16();
    let headers = collect_headers(upstream_response.headers());
    info!("{} {} -> {}", request.method(), request.url(), status_code);

    let body = upstream_response.bytes().await.map_err(|err| {
      error!("Reading proxy body failed {}", error_chain(&err));
      ProxyError::body_read(error_chain(&err))
    })?;

    debug!("Upstream body {} bytes", body.len());

    Ok(ProxyResponse {
      status_code,
      headers,
      body: String::from_utf8_lossy(&body).into_owned(),
    })
  }

  fn init_request(&self, request: &ProxyRequest) -> Result<RequestBuilder, ProxyError> {
    let method = Method::from_bytes(request.method().as_bytes())
      .map_err(|err| ProxyError::request_build(format!("method '{}': {}", request.method(), err)))?;

    let mut header_map = HeaderMap::with_capacity(request.headers().len());

    for (name, value) in request.headers().iter() {
      let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| ProxyError::request_build(format!("header name '{name}': {err}")))?;
      let header_value = HeaderValue::from_bytes(value.as_bytes())
        .map_err(|err| ProxyError::request_build(format!("header '{name}' value: {err}")))?;

      header_map.insert(header_name, header_value);
    }

    // Deviation: reqwest's client always carries `accept: */*` and fills it in
    // when the caller supplied no `accept`. Supplied headers replace it. Apart
    // from that only `host` and body framing are added by the transport.
    let mut builder = self.http_client
      .request(method, request.url().clone())
      .headers(header_map);

    if !request.body().is_empty() {
      builder = builder.body(request.body().clone());
    }

    Ok(builder)
  }
}

/// One value per name; with repeated upstream headers the last one seen wins.
fn collect_headers(upstream: &HeaderMap) -> Headers {
  let mut headers = Headers::new();

  for (name, value) in upstream.iter() {
    let value = match value.to_str() {
      Ok(text) => text.to_string(),
      Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };

    headers.insert(name.as_str(), value);
  }

  headers
}
