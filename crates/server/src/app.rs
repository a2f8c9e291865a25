use crate::{
    access,
    auth::password::hash_password,
    config::{PrincipalBootstrap, ServerConfig},
    doc,
    notify::{LogNotifier, Notifier, SmtpNotifier},
    routes::{auth, health, principal, root, student},
    session,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use database::services::{error::ServiceError, student::StudentService};
use log::info;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Could not hash the principal password: {0}")]
    Hash(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Builds the router with the session and access gate layers.
///
/// The session layer runs first so the gate can read the actor.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root::landing))
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(doc::openapi_json))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route(
            "/registration",
            get(auth::registration_page).post(auth::register),
        )
        .route(
            "/student/dashboard",
            get(student::dashboard).post(student::dashboard_action),
        )
        .route(
            "/student/courses",
            get(student::courses).post(student::purchase),
        )
        .route(
            "/student/profile",
            get(student::profile).post(student::update_profile),
        )
        .route(
            "/principal/dashboard",
            get(principal::dashboard).post(principal::dashboard_action),
        )
        .route(
            "/principal/courses",
            get(principal::courses).post(principal::courses_action),
        )
        .route("/principal/courses/new", post(principal::create_course))
        .route(
            "/principal/courses/{id}",
            get(principal::course).post(principal::update_course),
        )
        .route(
            "/principal/departments",
            get(principal::departments).post(principal::departments_action),
        )
        .route("/principal/students", get(principal::students))
        .route(
            "/principal/students/{id}",
            get(principal::student).post(principal::student_action),
        )
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn_with_state(
                    state.sessions.clone(),
                    session::middleware,
                ))
                .layer(middleware::from_fn(access::gate)),
        )
        .with_state(state)
}

/// SMTP when configured, otherwise mail is only logged
pub fn notifier(config: &ServerConfig) -> Arc<dyn Notifier> {
    match &config.email {
        Some(email) => {
            info!("Sending mail through {}:{}", email.smtp_host, email.smtp_port);
            Arc::new(SmtpNotifier::new(email.clone()))
        }
        None => {
            info!("SMTP_HOST not set, mail will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

/// Creates the configured principal account if it does not exist yet
pub async fn bootstrap_principal(
    db: &DatabaseConnection,
    principal: &PrincipalBootstrap,
) -> Result<(), BootstrapError> {
    let hash = hash_password(&principal.password).map_err(|e| BootstrapError::Hash(e.to_string()))?;

    if !StudentService::ensure_principal(db, &principal.email, hash).await? {
        info!("Principal account {} already exists", principal.email);
    }
    Ok(())
}
