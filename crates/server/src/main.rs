use database::db::create_connection;
use log::{error, info};
use migration::{Migrator, MigratorTrait};
use server::{
    app::{bootstrap_principal, build_router, notifier},
    config::ServerConfig,
    session::SessionStore,
    state::AppState,
    utils::shutdown::shutdown_signal,
};
use std::{error::Error, time::Duration};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(err) = run().await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::from_env()?;

    let db = create_connection(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    if let Some(principal) = &config.principal {
        bootstrap_principal(&db, principal).await?;
    }

    let sessions = SessionStore::with_limits(config.session_idle_timeout, config.session_capacity);
    tokio::spawn(sessions.clone().sweep(SESSION_SWEEP_PERIOD));

    let state = AppState {
        db,
        sessions,
        notifier: notifier(&config),
        mail_timeout: config.mail_timeout,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Running axum on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
