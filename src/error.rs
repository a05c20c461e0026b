use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyErrorKind {
  MalformedInput,
  MissingField,
  InvalidUrl,
  RequestBuildFailure,
  UpstreamFailure,
  BodyReadFailure,
}

impl ProxyErrorKind {
  pub fn status_code(self) -> u16 {
    match self {
      ProxyErrorKind::MalformedInput
      | ProxyErrorKind::MissingField
      | ProxyErrorKind::InvalidUrl
      | ProxyErrorKind::RequestBuildFailure => 400,
      ProxyErrorKind::UpstreamFailure | ProxyErrorKind::BodyReadFailure => 500,
    }
  }
}

/// Terminal failure of a single invocation. Every kind maps to a well-formed
/// error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProxyError {
  kind: ProxyErrorKind,
  message: String,
  details: Option<String>,
}

impl ProxyError {
  pub fn new(kind: ProxyErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
      details: None,
    }
  }

  pub fn with_details(mut self, details: impl Into<String>) -> Self {
    self.details = Some(details.into());
    self
  }

  pub fn malformed_input() -> Self {
    Self::new(ProxyErrorKind::MalformedInput, "Invalid request body format")
  }

  pub fn unreadable_request_body(details: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::MalformedInput, "Failed to read request body").with_details(details)
  }

  pub fn missing_url(message: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::MissingField, message)
  }

  pub fn invalid_url(details: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::InvalidUrl, "Invalid URL format").with_details(details)
  }

  pub fn request_build(details: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::RequestBuildFailure, "Error creating request").with_details(details)
  }

  pub fn upstream(details: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::UpstreamFailure, "Failed to send request to the url").with_details(details)
  }

  pub fn body_read(details: impl Into<String>) -> Self {
    Self::new(ProxyErrorKind::BodyReadFailure, "Failed to read response body").with_details(details)
  }

  pub fn kind(&self) -> ProxyErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn details(&self) -> Option<&str> {
    self.details.as_deref()
  }

  pub fn status_code(&self) -> u16 {
    self.kind.status_code()
  }
}

/// Failures talking to the function host itself. These never become proxy
/// envelopes; they are reported to the host or end the process.
#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("AWS_LAMBDA_RUNTIME_API is not set")]
  MissingRuntimeApi,

  #[error("runtime api did not send a request id")]
  MissingRequestId,

  #[error("runtime api responded with status {0}")]
  UnexpectedStatus(u16),

  #[error(transparent)]
  Http(#[from] reqwest::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

/// Flattens an error and its sources into one line. reqwest hides the useful
/// part (DNS, refused connection, TLS) in the source chain.
pub fn error_chain(error: &dyn std::error::Error) -> String {
  let mut text = error.to_string();
  let mut source = error.source();

  while let Some(cause) = source {
    let cause_text = cause.to_string();
    if !text.contains(&cause_text) {
      text.push_str(": ");
      text.push_str(&cause_text);
    }
    source = cause.source();
  }

  text
}
