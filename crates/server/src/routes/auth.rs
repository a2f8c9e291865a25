use crate::{
    access::{LOGIN_PATH, home_for},
    auth::password::{hash_password, verify_password},
    dtos::{forms::LoginForm, views::AuthView},
    error::AppResult,
    notify::send_welcome,
    routes::report,
    session::Session,
    state::AppState,
};
use axum::{
    Extension, Form, Json,
    extract::State,
    response::Redirect,
};
use chrono::{Datelike, Utc};
use database::services::{department::DepartmentService, student::StudentService};
use log::{error, info};
use models::{actor::Actor, student_form::RegistrationForm};

const REGISTRATION_PATH: &str = "/registration";

/// Login page
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login page with any queued notices", body = AuthView)),
    tag = "Authentication"
)]
pub async fn login_page(Extension(session): Extension<Session>) -> Json<AuthView> {
    Json(AuthView {
        notices: session.take_notices().await,
        departments: Vec::new(),
    })
}

/// Authenticates with email and password, then redirects to the actor's dashboard
#[utoipa::path(
    post,
    path = "/login",
    responses((status = 303, description = "Dashboard on success, login page otherwise")),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        session.error("Please enter both email and password.").await;
        return Redirect::to(LOGIN_PATH);
    }

    let account = match StudentService::find_by_email(&state.db, username).await {
        Ok(account) => account,
        Err(err) => {
            report(&session, err).await;
            return Redirect::to(LOGIN_PATH);
        }
    };

    let Some(account) = account else {
        session
            .error("No account found with this email. Please register first.")
            .await;
        return Redirect::to(LOGIN_PATH);
    };

    let verified = verify_password(&form.password, &account.password_hash).unwrap_or_else(|err| {
        error!("Stored password hash for {} is unreadable: {err}", account.id);
        false
    });
    if !verified {
        session.error("Invalid password. Please try again.").await;
        return Redirect::to(LOGIN_PATH);
    }

    let actor = Actor::new(account.id, account.role);
    session.login(actor).await;
    info!("{} logged in as {}", account.email, account.role);

    Redirect::to(home_for(&actor))
}

/// Ends the session
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Back to the login page")),
    tag = "Authentication"
)]
pub async fn logout(Extension(session): Extension<Session>) -> Redirect {
    if session.actor().await.is_some() {
        session.logout().await;
        session.info("You have been logged out.").await;
    }
    Redirect::to(LOGIN_PATH)
}

/// Registration page; lists departments for the department picker
#[utoipa::path(
    get,
    path = "/registration",
    responses((status = 200, description = "Registration page with departments", body = AuthView)),
    tag = "Authentication"
)]
pub async fn registration_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<AuthView>> {
    let departments = DepartmentService::list(&state.db).await?;

    Ok(Json(AuthView {
        notices: session.take_notices().await,
        departments,
    }))
}

/// Registers a student account and sends the welcome email
#[utoipa::path(
    post,
    path = "/registration",
    responses((status = 303, description = "Login page on success, registration page otherwise")),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<RegistrationForm>,
) -> Redirect {
    let clean = match form.clean(Utc::now().year()) {
        Ok(clean) => clean,
        Err(errors) => {
            session.error("Please correct the errors below.").await;
            for message in errors.messages() {
                session.error(message).await;
            }
            return Redirect::to(REGISTRATION_PATH);
        }
    };

    let password_hash = match hash_password(&clean.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Password hashing failed: {err}");
            session.error("Something went wrong. Please try again.").await;
            return Redirect::to(REGISTRATION_PATH);
        }
    };

    let student = match StudentService::register(&state.db, clean, password_hash).await {
        Ok(student) => student,
        Err(err) => {
            report(&session, err).await;
            return Redirect::to(REGISTRATION_PATH);
        }
    };

    if send_welcome(state.notifier.as_ref(), state.mail_timeout, &student).await {
        session
            .success("Registration successful! A welcome email has been sent to your inbox.")
            .await;
    } else {
        session
            .success("Registration successful! (Note: Welcome email could not be sent)")
            .await;
    }

    Redirect::to(LOGIN_PATH)
}
