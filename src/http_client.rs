use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

use crate::config::Config;

/// Outbound client policy for forwarded calls.
///
/// `timeout: None` leaves forwarded calls unbounded: a hung upstream holds
/// the invocation until the host gives up on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
  pub http_proxy: Option<String>,
  pub user: Option<String>,
  pub pass: Option<String>,
  pub redirect_limit: usize,
  pub timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
  fn default() -> Self {
    Self {
      http_proxy: None,
      user: None,
      pass: None,
      redirect_limit: 10,
      timeout: None,
    }
  }
}

impl From<&Config> for HttpClientConfig {
  fn from(config: &Config) -> Self {
    Self {
      http_proxy: config.proxy_url.clone(),
      user: config.proxy_auth_user.clone(),
      pass: config.proxy_auth_pass.clone(),
      redirect_limit: config.redirect_limit,
      timeout: config.timeout_secs.map(Duration::from_secs),
    }
  }
}

impl HttpClientConfig {
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let HttpClientConfig {
      http_proxy,
      user,
      pass,
      redirect_limit,
      timeout,
    } = self;
    // Only the configured outbound proxy applies, never HTTP_PROXY and friends.
    let mut client_builder = reqwest::ClientBuilder::new().no_proxy();

    if let Some(proxy_url) = http_proxy {
      let mut proxy = reqwest::Proxy::all(proxy_url)?;

      if let (Some(user_name), Some(password)) = (user, pass) {
        proxy = proxy.basic_auth(&user_name, &password);
      }

      client_builder = client_builder.proxy(proxy);
    }

    if let Some(timeout) = timeout {
      client_builder = client_builder.timeout(timeout);
    }

    let redirect_policy = if redirect_limit == 0 {
      Policy::none()
    } else {
      Policy::limited(redirect_limit)
    };

    let client = client_builder.redirect(redirect_policy).build()?;

    Ok(client)
  }
}
