use actix_web::{web, App, HttpServer};
use log::info;

use crate::config::Config;
use crate::envelope::local_dev::{self, LOCAL_DEV_PATH};
use crate::pipeline::Pipeline;

/// Serves the local-dev endpoint until the server is stopped. Each worker
/// handles connections independently; the pipeline is shared read-only.
pub async fn serve(config: &Config, pipeline: Pipeline) -> std::io::Result<()> {
  let pipeline = web::Data::new(pipeline);

  info!("Local dev listener on http://{}:{}{}", config.bind, config.port, LOCAL_DEV_PATH);

  HttpServer::new(move || {
    App::new()
      .app_data(pipeline.clone())
      .configure(local_dev::configure)
  })
    .workers(config.worker_count)
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}
