use crate::{access::home_for, dtos::views::LandingView, session::Session};
use axum::{Extension, Json};

/// Landing page, open to everyone
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page with any queued notices", body = LandingView)
    ),
    tag = "Pages"
)]
pub async fn landing(Extension(session): Extension<Session>) -> Json<LandingView> {
    let actor = session.actor().await;

    Json(LandingView {
        notices: session.take_notices().await,
        home: actor.as_ref().map(home_for),
        actor,
    })
}
