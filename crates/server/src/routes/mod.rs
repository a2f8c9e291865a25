pub mod auth;
pub mod health;
pub mod principal;
pub mod root;
pub mod student;

use crate::session::Session;
use database::services::error::ServiceError;
use log::error;
use uuid::Uuid;

/// Queues one error notice per user-facing message of `err`
pub(crate) async fn report(session: &Session, err: ServiceError) {
    if let ServiceError::Database(db_err) = &err {
        error!("Database error: {db_err}");
    }

    for message in err.messages() {
        session.error(message).await;
    }
}

/// Parses a submitted id, treating blanks and garbage as absent
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {id} ")), Some(id));
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("42"), None);
    }
}
