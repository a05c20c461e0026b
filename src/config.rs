use std::env;
use std::io::ErrorKind;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
  Cloud,
  LocalDev,
}

impl From<&str> for ExecutionMode {
  fn from(value: &str) -> Self {
    if value.trim().eq_ignore_ascii_case("dev") {
      ExecutionMode::LocalDev
    } else {
      ExecutionMode::Cloud
    }
  }
}

// Read once in `main`, then passed by reference.
#[derive(Parser, Debug, Clone)]
#[command(name = "lambda_relay", version, about = "Relays described HTTP requests and returns the upstream reply")]
pub struct Config {
  /// `dev` serves the local listener, anything else runs as a function.
  #[arg(long, env = "ENVIRONMENT", default_value = "production")]
  pub environment: String,

  #[arg(long, env = "HTTP_BIND", default_value = "0.0.0.0")]
  pub bind: String,

  #[arg(long, env = "HTTP_PORT", default_value_t = 8081)]
  pub port: u16,

  #[arg(long, env = "HTTP_WORKER_COUNT", default_value_t = 4)]
  pub worker_count: usize,

  #[arg(long, env = "AWS_LAMBDA_RUNTIME_API")]
  pub runtime_api: Option<String>,

  /// Redirects followed per forwarded call, 0 returns redirects as-is.
  #[arg(long, env = "FORWARD_REDIRECT_LIMIT", default_value_t = 10)]
  pub redirect_limit: usize,

  /// Unset means forwarded calls wait on the upstream indefinitely.
  #[arg(long, env = "FORWARD_TIMEOUT_SECS")]
  pub timeout_secs: Option<u64>,

  #[arg(long, env = "HTTP_PROXY_URL")]
  pub proxy_url: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub proxy_auth_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS", hide_env_values = true)]
  pub proxy_auth_pass: Option<String>,

  #[arg(long, env = "LOG_LEVEL", default_value = "info")]
  pub log_level: LevelFilter,
}

impl Config {
  pub fn mode(&self) -> ExecutionMode {
    ExecutionMode::from(self.environment.as_str())
  }
}

#[derive(Debug, PartialEq, Eq)]
pub enum EnvFile {
  Loaded(PathBuf),
  Missing(PathBuf),
  Invalid(PathBuf, String),
}

/// Best-effort load of the env file named by `ENV_FILE` (default `.env`).
/// Variables already set in the process environment are left alone.
pub fn load_env_file() -> EnvFile {
  let path = PathBuf::from(env::var("ENV_FILE").unwrap_or_else(|_| DEFAULT_ENV_FILE.to_string()));

  match dotenvy::from_path(&path) {
    Ok(()) => EnvFile::Loaded(path),
    Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => EnvFile::Missing(path),
    Err(err) => EnvFile::Invalid(path, err.to_string()),
  }
}
