//! Admin console session service

use actix_web::{App, HttpServer};
use clap::Parser;
use color_eyre::Result;
use std::io::read_to_string;
use tracing::{info, instrument};
use tracing_actix_web::TracingLogger;

use crate::config::{Config, LogFormat};
use crate::model::Model;
use crate::opt::Opt;

mod config;
mod guard;
pub mod model;
mod mutation;
mod opt;
mod query;
mod service;

/// Initializes tracing collection
fn setup_tracing(config: config::Logging) {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    let filter_layer = config.filters.into_iter().fold(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        EnvFilter::add_directive,
    );

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

/// Opens the session store, deactivating leftover expired sessions and creating the first
/// administrator if configured
#[instrument(skip_all)]
async fn prepare_store(db: config::Database, admin: Option<config::Admin>) -> Result<Model> {
    let model = Model::with_config(db).await?;
    model.cleanup().await?;

    if let Some(admin) = admin {
        model.bootstrap(admin).await?;
    }

    Ok(model)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Opt {
        config: mut config_file,
    } = Opt::parse();

    let Config {
        host,
        graphiql,
        logging,
        db,
        session,
        admin,
    } = toml::from_str(&read_to_string(&mut config_file)?)?;

    setup_tracing(logging);
    color_eyre::install()?;

    info!(
        config = ?config_file.path().path(),
        gate = ?session.gate,
        ttl_hours = session.ttl_hours,
        "Tracing initialized, setting up a service"
    );

    let model = prepare_store(db, admin).await?;
    let service_config = service::configure(graphiql, model, session).await?;

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .configure(service_config.clone())
    })
    .bind(host)?
    .run()
    .await?;

    info!("Service stopped, tearing down");
    Ok(())
}
