use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use mailflow::clients::send::HttpSendEndpoint;
use mailflow::config::Config;
use mailflow::job_controller::state::{start_job_updater, JobsState};
use mailflow::services;
use mailflow::services::data_sources::DatasetsState;
use mailflow::store::Store;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let store = Store::open(&config.database_path).map_err(io::Error::other)?;

    // The client timeout only backstops the per-call limits the dispatcher sets.
    let client_timeout = config
        .dispatch_config()
        .batch_timeout
        .max(config.test_send_timeout());
    let endpoint = HttpSendEndpoint::new(config.send_endpoint_url.clone(), client_timeout)
        .map_err(io::Error::other)?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::with_retention(config.job_retention());
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        start_job_updater(updater_state, rx).await;
    });

    let datasets = DatasetsState::with_capacity(config.max_datasets);
    let (host, port) = config.bind_address();
    let max_upload_bytes = config.max_upload_bytes;

    info!("Server running at http://{}:{}", host, port);
    info!("Sending through {}", endpoint.url());

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(max_upload_bytes))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(endpoint.clone()))
            .app_data(web::Data::new(jobs_state.clone()))
            .app_data(web::Data::new(datasets.clone()))
            .service(services::templates::configure_routes())
            .service(services::data_sources::csv::configure_routes())
            .service(services::merge::configure_routes())
            .service(services::logs::configure_routes())
            .service(services::contacts::configure_routes())
    })
    .bind((host, port))?
    .run()
    .await
}
