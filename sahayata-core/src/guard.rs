//! Render-time access guard for protected views
//!
//! A guard resolves once against the session client (and, for admin views,
//! the caller's profile) and then follows session changes for as long as the
//! view is mounted. Protected content is only handed out in
//! [`GuardState::Authorized`].
//!
//! ```text
//! Checking ──► Authorized ──► Redirecting
//!     └────────────────────────────▲
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::client::{fetch_profile, AuthEvent, RowClient, SessionClient};
use crate::routes::{LANDING_ROUTE, LOGIN_ROUTE};

/// What the guarded view requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// Any signed-in user
    Authenticated,
    /// Signed-in user whose profile role is admin
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    /// Navigation away to the given route; terminal
    Redirecting(&'static str),
}

impl GuardState {
    /// Apply a transition, returning whether the state changed.
    /// `Redirecting` is terminal and `Authorized` can only be left for
    /// `Redirecting`.
    fn advance(&mut self, next: GuardState) -> bool {
        let allowed = match (&*self, &next) {
            (GuardState::Checking, GuardState::Checking) => false,
            (GuardState::Checking, _) => true,
            (GuardState::Authorized, GuardState::Redirecting(_)) => true,
            _ => false,
        };
        if allowed {
            *self = next;
        }
        allowed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Guard {
    kind: GuardKind,
}

impl Guard {
    pub fn new(kind: GuardKind) -> Self {
        Self { kind }
    }

    pub fn authenticated() -> Self {
        Self::new(GuardKind::Authenticated)
    }

    pub fn admin() -> Self {
        Self::new(GuardKind::Admin)
    }

    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    /// Resolve the guard once
    ///
    /// Session lookup failures send the visitor to the login route. For
    /// admin views, a profile that cannot be fetched counts as non-admin and
    /// sends the user to the landing route.
    pub async fn check<S, R>(&self, sessions: &S, rows: &R) -> GuardState
    where
        S: SessionClient + ?Sized,
        R: RowClient + ?Sized,
    {
        let session = match sessions.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("No active session, redirecting to login");
                return GuardState::Redirecting(LOGIN_ROUTE);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, redirecting to login");
                return GuardState::Redirecting(LOGIN_ROUTE);
            }
        };

        if self.kind == GuardKind::Authenticated {
            return GuardState::Authorized;
        }

        match fetch_profile(rows, &session.user_id).await {
            Ok(Some(profile)) if profile.role.is_admin() => {
                tracing::debug!(user_id = %session.user_id, "Admin access granted");
                GuardState::Authorized
            }
            Ok(Some(_)) => {
                tracing::debug!(user_id = %session.user_id, "User is not an admin");
                GuardState::Redirecting(LANDING_ROUTE)
            }
            Ok(None) => {
                tracing::warn!(user_id = %session.user_id, "No profile found for session");
                GuardState::Redirecting(LANDING_ROUTE)
            }
            Err(e) => {
                tracing::error!(user_id = %session.user_id, error = %e, "Error fetching profile");
                GuardState::Redirecting(LANDING_ROUTE)
            }
        }
    }

    /// Start guarding a mounted view
    ///
    /// Subscribes to session changes before the check starts so a sign-out
    /// racing the check is never missed. Must be called inside a tokio
    /// runtime.
    pub fn mount(
        self,
        sessions: Arc<dyn SessionClient>,
        rows: Arc<dyn RowClient>,
    ) -> MountedGuard {
        let (tx, rx) = watch::channel(GuardState::Checking);
        let tx = Arc::new(tx);
        let alive = Arc::new(AtomicBool::new(true));
        let events = sessions.subscribe();

        let check_task = {
            let tx = tx.clone();
            let alive = alive.clone();
            tokio::spawn(async move {
                let result = self.check(sessions.as_ref(), rows.as_ref()).await;
                if !alive.load(Ordering::SeqCst) {
                    tracing::debug!("Guard unmounted before check resolved, ignoring result");
                    return;
                }
                tx.send_if_modified(|state| state.advance(result));
            })
        };

        let watch_task = tokio::spawn(follow_session(events, tx, alive.clone()));

        MountedGuard {
            state: rx,
            alive,
            check_task,
            watch_task,
        }
    }
}

async fn follow_session(
    mut events: broadcast::Receiver<AuthEvent>,
    tx: Arc<watch::Sender<GuardState>>,
    alive: Arc<AtomicBool>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if !alive.load(Ordering::SeqCst) {
                    return;
                }
                if event.session().is_none() {
                    tracing::debug!("Signed out while guarded, redirecting to login");
                    tx.send_if_modified(|state| {
                        state.advance(GuardState::Redirecting(LOGIN_ROUTE))
                    });
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Guard lagged behind session events");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// A guard attached to a live view; dropping it unmounts the guard
pub struct MountedGuard {
    state: watch::Receiver<GuardState>,
    alive: Arc<AtomicBool>,
    check_task: JoinHandle<()>,
    watch_task: JoinHandle<()>,
}

impl MountedGuard {
    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Wait for the next state change; returns the new state
    pub async fn changed(&mut self) -> GuardState {
        // The sender lives in the spawned tasks; once both finish the
        // state is final.
        let _ = self.state.changed().await;
        self.state()
    }

    /// Wait until the initial check has resolved
    pub async fn settled(&mut self) -> GuardState {
        let settled = self
            .state
            .wait_for(|state| *state != GuardState::Checking)
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Route the view should navigate to, if any
    pub fn redirect(&self) -> Option<&'static str> {
        match *self.state.borrow() {
            GuardState::Redirecting(route) => Some(route),
            _ => None,
        }
    }

    /// Hand out the protected content only once authorized
    pub fn render<T>(&self, content: T) -> Option<T> {
        match *self.state.borrow() {
            GuardState::Authorized => Some(content),
            _ => None,
        }
    }

    pub fn is_check_finished(&self) -> bool {
        self.check_task.is_finished()
    }
}

impl Drop for MountedGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.watch_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = GuardState::Checking;
        assert!(state.advance(GuardState::Authorized));
        assert!(!state.advance(GuardState::Checking));
        assert!(state.advance(GuardState::Redirecting(LOGIN_ROUTE)));
        assert!(!state.advance(GuardState::Authorized));
        assert_eq!(state, GuardState::Redirecting(LOGIN_ROUTE));
    }

    #[test]
    fn test_redirect_is_terminal() {
        let mut state = GuardState::Checking;
        assert!(state.advance(GuardState::Redirecting(LANDING_ROUTE)));
        assert!(!state.advance(GuardState::Redirecting(LOGIN_ROUTE)));
        assert_eq!(state, GuardState::Redirecting(LANDING_ROUTE));
    }
}
