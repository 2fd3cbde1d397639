//! Shared application state

use std::sync::Arc;

use crate::email::Mailer;
use crate::objects::ObjectStore;
use crate::store::{RowStore, SessionStore, UserStore};

/// Application state shared by all handlers
pub struct AppState<U, S, R, M>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    pub user_store: Arc<U>,
    pub session_store: Arc<S>,
    pub row_store: Arc<R>,
    pub mailer: M,
    pub objects: ObjectStore,
    /// Lowercased addresses that receive the admin role at sign-up
    pub admin_emails: Vec<String>,
}

impl<U, S, R, M> AppState<U, S, R, M>
where
    U: UserStore,
    S: SessionStore,
    R: RowStore,
    M: Mailer,
{
    pub fn new(
        user_store: U,
        session_store: S,
        row_store: R,
        mailer: M,
        objects: ObjectStore,
    ) -> Self {
        Self {
            user_store: Arc::new(user_store),
            session_store: Arc::new(session_store),
            row_store: Arc::new(row_store),
            mailer,
            objects,
            admin_emails: Vec::new(),
        }
    }

    pub fn with_admin_emails(mut self, admin_emails: Vec<String>) -> Self {
        self.admin_emails = admin_emails;
        self
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|admin| *admin == email)
    }
}
