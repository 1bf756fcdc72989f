use rusqlite::Connection;

use crate::db;
use crate::error::{Error, Result};
use crate::models::{User, UserId};

/// proof that a user logged in; only `login` can make one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    user: User,
}

impl AuthenticatedUser {
    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }
}

/// new account; blank names are refused since they could never log in
pub fn register(conn: &Connection, username: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::BlankUsername);
    }
    let user = db::insert_user(conn, username)?;
    tracing::info!(user = %user.username, "user registered");
    Ok(user)
}

pub fn login(conn: &Connection, username: &str) -> Result<AuthenticatedUser> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Unauthenticated);
    }
    match db::find_user_by_name(conn, username)? {
        Some(user) => {
            tracing::info!(user = %user.username, "logged in");
            Ok(AuthenticatedUser { user })
        }
        None => {
            tracing::warn!(user = %username, "login refused, unknown user");
            Err(Error::Unauthenticated)
        }
    }
}

/// resolves an optional session into a user, refusing anonymous access
pub fn require(session: Option<&AuthenticatedUser>) -> Result<&AuthenticatedUser> {
    session.ok_or(Error::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::in_memory_db;

    #[test]
    fn blank_username_is_not_registered() {
        let conn = in_memory_db();
        assert!(matches!(register(&conn, ""), Err(Error::BlankUsername)));
        assert!(matches!(register(&conn, "   "), Err(Error::BlankUsername)));
        assert_eq!(db::find_user_by_name(&conn, "").unwrap(), None);
    }

    #[test]
    fn registered_user_can_log_in() {
        let conn = in_memory_db();
        let carol = register(&conn, " carol ").unwrap();
        assert_eq!(carol.username, "carol");
        assert_eq!(login(&conn, "carol").unwrap().id(), carol.id);
    }

    #[test]
    fn known_user_logs_in() {
        let conn = in_memory_db();
        let alice = db::insert_user(&conn, "alice").unwrap();
        let session = login(&conn, " alice ").unwrap();
        assert_eq!(session.id(), alice.id);
        assert_eq!(session.username(), "alice");
    }

    #[test]
    fn unknown_or_blank_user_refused() {
        let conn = in_memory_db();
        assert!(matches!(login(&conn, "mallory"), Err(Error::Unauthenticated)));
        assert!(matches!(login(&conn, ""), Err(Error::Unauthenticated)));
    }

    #[test]
    fn anonymous_session_refused() {
        assert!(matches!(require(None), Err(Error::Unauthenticated)));
    }
}
