pub mod config;
pub mod dev_server;
pub mod envelope;
pub mod error;
pub mod forwarder;
pub mod http_client;
pub mod lambda_runtime;
pub mod pipeline;
pub mod proxy_request;
pub mod response_builder;
pub mod std_logger;
pub mod validator;

pub use config::{Config, ExecutionMode};
pub use error::{ProxyError, ProxyErrorKind, RuntimeError};
pub use pipeline::Pipeline;
pub use proxy_request::{Headers, ProxyRequest, ProxyResponse};
pub use response_builder::OutboundEnvelope;
