use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use models::actor::Actor;
use log::debug;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "portal_session";

/// Severity of a queued notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One-shot message shown on the next rendered view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Idle time after which a session is forgotten
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Most sessions held at once
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct SessionData {
    actor: Option<Actor>,
    notices: Vec<Notice>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            actor: None,
            notices: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    fn is_empty(&self) -> bool {
        self.actor.is_none() && self.notices.is_empty()
    }
}

/// In-process session storage keyed by the opaque cookie id.
///
/// Sessions idle for longer than `idle_timeout` are dropped. The store holds
/// at most `capacity` sessions; when full, the least recently used one goes.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionData>>>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_CAPACITY)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    fn is_idle(&self, data: &SessionData) -> bool {
        data.last_seen.elapsed() > self.idle_timeout
    }

    async fn contains(&self, id: Uuid) -> bool {
        self.inner
            .read()
            .await
            .get(&id)
            .is_some_and(|data| !self.is_idle(data))
    }

    /// Drops every idle session and returns how many went
    pub async fn purge_idle(&self) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, data| !self.is_idle(data));
        before - sessions.len()
    }

    /// Purges idle sessions every `period`, forever
    pub async fn sweep(self, period: Duration) {
        let mut ticks = tokio::time::interval(period);
        loop {
            ticks.tick().await;
            let purged = self.purge_idle().await;
            if purged > 0 {
                debug!("Purged {purged} idle sessions");
            }
        }
    }

    /// Handle for `incoming` if it names a live session, otherwise for a fresh id
    async fn open(&self, incoming: Option<Uuid>) -> Session {
        let id = match incoming {
            Some(id) if self.touch(id).await => id,
            _ => Uuid::new_v4(),
        };

        Session {
            id: Arc::new(RwLock::new(id)),
            store: self.clone(),
        }
    }

    /// Restarts the idle clock of `id`; an idle session is forgotten instead
    async fn touch(&self, id: Uuid) -> bool {
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(&id) {
            Some(data) if !self.is_idle(data) => {
                data.last_seen = Instant::now();
                true
            }
            Some(_) => {
                sessions.remove(&id);
                false
            }
            None => false,
        }
    }

    /// Frees a slot for one more session
    fn make_room(&self, sessions: &mut HashMap<Uuid, SessionData>) {
        if sessions.len() < self.capacity {
            return;
        }

        sessions.retain(|_, data| !self.is_idle(data));
        if sessions.len() < self.capacity {
            return;
        }

        let oldest = sessions
            .iter()
            .min_by_key(|(_, data)| data.last_seen)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            debug!("Session store full, dropping session {id}");
            sessions.remove(&id);
        }
    }
}

/// The requester's session, placed in request extensions by [`middleware`].
///
/// Nothing is stored until the session is written to, so anonymous
/// requests without notices do not get a cookie.
#[derive(Clone)]
pub struct Session {
    id: Arc<RwLock<Uuid>>,
    store: SessionStore,
}

impl Session {
    pub async fn id(&self) -> Uuid {
        *self.id.read().await
    }

    pub async fn actor(&self) -> Option<Actor> {
        let id = self.id.read().await;
        self.store
            .inner
            .read()
            .await
            .get(&id)
            .and_then(|data| data.actor)
    }

    /// Binds `actor` to the session under a new id
    pub async fn login(&self, actor: Actor) {
        self.cycle(Some(actor)).await;
    }

    /// Forgets the actor and moves the remaining notices to a new id
    pub async fn logout(&self) {
        self.cycle(None).await;
    }

    async fn cycle(&self, actor: Option<Actor>) {
        let mut id = self.id.write().await;
        let mut sessions = self.store.inner.write().await;

        let mut data = sessions.remove(&id).unwrap_or_else(SessionData::new);
        data.actor = actor;
        data.last_seen = Instant::now();

        *id = Uuid::new_v4();
        self.store.make_room(&mut sessions);
        sessions.insert(*id, data);
    }

    pub async fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let id = self.id.read().await;
        let mut sessions = self.store.inner.write().await;

        if !sessions.contains_key(&id) {
            self.store.make_room(&mut sessions);
        }
        sessions
            .entry(*id)
            .or_insert_with(SessionData::new)
            .notices
            .push(Notice {
                level,
                message: message.into(),
            });
    }

    pub async fn success(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Success, message).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Info, message).await;
    }

    pub async fn warning(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Warning, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.notify(NoticeLevel::Error, message).await;
    }

    /// Removes and returns every queued notice
    pub async fn take_notices(&self) -> Vec<Notice> {
        let id = self.id.read().await;
        let mut sessions = self.store.inner.write().await;

        let Some(data) = sessions.get_mut(&id) else {
            return Vec::new();
        };
        let notices = std::mem::take(&mut data.notices);
        if data.is_empty() {
            sessions.remove(&id);
        }
        notices
    }
}

/// Reads the session id from the request's `Cookie` headers
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn session_cookie(id: Uuid) -> Option<HeaderValue> {
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Attaches a [`Session`] to the request and issues the cookie when the id changed
pub async fn middleware(
    State(store): State<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let incoming = session_id(request.headers());
    let session = store.open(incoming).await;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let current = session.id().await;
    if incoming != Some(current)
        && store.contains(current).await
        && let Some(value) = session_cookie(current)
    {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::role::Role;

    #[tokio::test]
    async fn test_notices_drain_once() {
        let store = SessionStore::new();
        let session = store.open(None).await;

        session.success("Saved").await;
        session.error("Oops").await;

        let notices = session.take_notices().await;
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert!(session.take_notices().await.is_empty());
        assert!(!store.contains(session.id().await).await);
    }

    #[tokio::test]
    async fn test_login_rotates_id_and_keeps_notices() {
        let store = SessionStore::new();
        let session = store.open(None).await;
        session.info("Welcome").await;
        let before = session.id().await;

        let actor = Actor::new(Uuid::new_v4(), Role::Student);
        session.login(actor).await;

        assert_ne!(session.id().await, before);
        assert_eq!(session.actor().await, Some(actor));
        assert_eq!(session.take_notices().await.len(), 1);

        session.logout().await;
        assert_eq!(session.actor().await, None);
    }

    #[tokio::test]
    async fn test_unknown_cookie_gets_fresh_id() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();
        let session = store.open(Some(stale)).await;
        assert_ne!(session.id().await, stale);
    }

    #[tokio::test]
    async fn test_idle_session_is_evicted() {
        let store = SessionStore::with_limits(Duration::from_millis(20), DEFAULT_CAPACITY);
        let session = store.open(None).await;
        session.error("Please login to access this page.").await;
        let id = session.id().await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(!store.contains(id).await);
        assert_eq!(store.purge_idle().await, 1);
        assert!(store.is_empty().await);

        let reopened = store.open(Some(id)).await;
        assert_ne!(reopened.id().await, id);
    }

    #[tokio::test]
    async fn test_store_never_exceeds_capacity() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 3);

        let first = store.open(None).await;
        first.info("first").await;
        let first_id = first.id().await;

        for _ in 0..100 {
            let anonymous = store.open(None).await;
            anonymous.error("Please login to access this page.").await;
        }

        assert_eq!(store.len().await, 3);
        assert!(!store.contains(first_id).await);
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));

        let set = session_cookie(id).unwrap();
        let set = set.to_str().unwrap();
        assert!(set.starts_with(&format!("{SESSION_COOKIE}={id}")));
        assert!(set.contains("HttpOnly"));
    }
}
