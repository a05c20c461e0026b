use std::io::{Error, ErrorKind, Result};

use clap::Parser;
use lambda_relay::config::{self, EnvFile};
use lambda_relay::lambda_runtime::{self, RuntimeClient};
use lambda_relay::{dev_server, std_logger, Config, ExecutionMode, Pipeline};
use log::{error, info, warn};

#[actix_web::main]
async fn main() -> Result<()> {
  let env_file = config::load_env_file();
  let config = Config::parse();

  std_logger::init(config.log_level)
    .map_err(|error| Error::new(ErrorKind::Other, error))?;

  match env_file {
    EnvFile::Loaded(path) => info!("Loaded environment from {}", path.display()),
    EnvFile::Missing(path) => info!("No environment file at {}, using process environment", path.display()),
    EnvFile::Invalid(path, reason) => warn!("Ignoring environment file {}: {}", path.display(), reason),
  }

  match config.mode() {
    ExecutionMode::LocalDev => {
      let pipeline = Pipeline::from_config(&config)
        .map_err(|error| Error::new(ErrorKind::Other, error))?;

      dev_server::serve(&config, pipeline).await
    }
    ExecutionMode::Cloud => {
      let client = RuntimeClient::from_config(&config)
        .map_err(|error| Error::new(ErrorKind::Other, error))?;

      let pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(init_error) => {
          if let Err(report_error) = client.send_init_error("InitError", &init_error.to_string()).await {
            error!("Reporting init failure failed {}", report_error);
          }
          return Err(Error::new(ErrorKind::Other, init_error));
        }
      };

      lambda_runtime::run(&client, &pipeline)
        .await
        .map_err(|error| Error::new(ErrorKind::Other, error))
    }
  }
}
