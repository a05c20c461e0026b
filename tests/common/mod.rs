//! Shared upstreams and helpers for the integration tests.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use lambda_relay::envelope::api_gateway::ApiGatewayProxyRequest;
use lambda_relay::forwarder::Forwarder;
use lambda_relay::http_client::HttpClientConfig;
use lambda_relay::Pipeline;
use serde_json::{json, Value};

pub struct Upstream {
  base_url: String,
  hits: Arc<AtomicUsize>,
}

impl Upstream {
  pub fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  #[allow(dead_code)]
  pub fn hits(&self) -> usize {
    self.hits.load(Ordering::SeqCst)
  }
}

async fn inspect(request: HttpRequest, body: web::Bytes, hits: web::Data<AtomicUsize>) -> HttpResponse {
  hits.fetch_add(1, Ordering::SeqCst);

  let headers: Vec<(String, String)> = request.headers()
    .iter()
    .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
    .collect();

  HttpResponse::Ok().json(json!({
    "method": request.method().as_str(),
    "headers": headers,
    "body": String::from_utf8_lossy(&body),
  }))
}

async fn echo(request: HttpRequest, body: web::Bytes, hits: web::Data<AtomicUsize>) -> HttpResponse {
  hits.fetch_add(1, Ordering::SeqCst);

  HttpResponse::Ok()
    .insert_header(("x-echo-method", request.method().as_str()))
    .body(body)
}

async fn ok() -> HttpResponse {
  HttpResponse::Ok()
    .content_type("application/json")
    .body(r#"{"ok":true}"#)
}

async fn redirect() -> HttpResponse {
  HttpResponse::Found()
    .insert_header(("location", "/ok"))
    .finish()
}

async fn status(code: web::Path<u16>) -> HttpResponse {
  let status = StatusCode::from_u16(code.into_inner()).unwrap_or(StatusCode::IM_A_TEAPOT);
  HttpResponse::build(status).body("status")
}

/// In-process actix upstream. Must be called inside an actix runtime.
pub fn start_upstream() -> Upstream {
  let hits = Arc::new(AtomicUsize::new(0));
  let counter = web::Data::from(hits.clone());

  let server = HttpServer::new(move || {
    App::new()
      .app_data(counter.clone())
      .route("/inspect", web::route().to(inspect))
      .route("/echo", web::route().to(echo))
      .route("/ok", web::route().to(ok))
      .route("/redirect", web::route().to(redirect))
      .route("/status/{code}", web::route().to(status))
  })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

  let addr = server.addrs()[0];
  actix_web::rt::spawn(server.run());

  Upstream {
    base_url: format!("http://{addr}"),
    hits,
  }
}

fn read_request_head(stream: &mut TcpStream) {
  let mut buffer = Vec::new();
  let mut chunk = [0u8; 1024];

  while !buffer.windows(4).any(|window| window == b"\r\n\r\n") {
    match stream.read(&mut chunk) {
      Ok(0) | Err(_) => break,
      Ok(read) => buffer.extend_from_slice(&chunk[..read]),
    }
  }
}

/// Answers `connections` requests with the same raw bytes, then stops.
#[allow(dead_code)]
pub fn start_raw_upstream(response: &'static str, connections: usize) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();

  thread::spawn(move || {
    for stream in listener.incoming().take(connections) {
      let Ok(mut stream) = stream else { break };
      read_request_head(&mut stream);
      let _ = stream.write_all(response.as_bytes());
      let _ = stream.flush();
      let _ = stream.shutdown(Shutdown::Write);
      thread::sleep(Duration::from_millis(20));
    }
  });

  format!("http://{addr}/raw")
}

/// Accepts one request and never answers it.
#[allow(dead_code)]
pub fn start_silent_upstream(hold: Duration) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();

  thread::spawn(move || {
    if let Some(Ok(mut stream)) = listener.incoming().next() {
      read_request_head(&mut stream);
      thread::sleep(hold);
    }
  });

  format!("http://{addr}/silent")
}

#[allow(dead_code)]
pub fn closed_port_url() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  format!("http://{addr}/unreachable")
}

#[allow(dead_code)]
pub fn pipeline_with(config: HttpClientConfig) -> Pipeline {
  Pipeline::new(Forwarder::new(config.to_client().unwrap()))
}

#[allow(dead_code)]
pub fn pipeline() -> Pipeline {
  pipeline_with(HttpClientConfig::default())
}

#[allow(dead_code)]
pub fn gateway_event(body: Value) -> ApiGatewayProxyRequest {
  ApiGatewayProxyRequest {
    http_method: Some("POST".to_string()),
    path: Some("/relay".to_string()),
    body: Some(body.to_string()),
    ..ApiGatewayProxyRequest::default()
  }
}

#[allow(dead_code)]
pub fn parse_body(body: &str) -> Value {
  serde_json::from_str(body).unwrap()
}
