use crate::{access::LOGIN_PATH, session::Session};
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use models::actor::Actor;

/// The logged-in actor of the request.
///
/// Rejects with a redirect to the login page when the session has no actor.
/// Role checks happen in the access gate and again in the services.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| Redirect::to(LOGIN_PATH).into_response())?;

        match session.actor().await {
            Some(actor) => Ok(CurrentActor(actor)),
            None => Err(Redirect::to(LOGIN_PATH).into_response()),
        }
    }
}
