//! Credential check and simulated login round trip.
//!
//! Passwords are compared in plain text against the fixture credential
//! table. This is demo data, not a security boundary.

use crate::error::AuthError;
use crate::types::{Credential, User};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default simulated latency of a login attempt.
pub const DEFAULT_LOGIN_DELAY_MS: u64 = 1000;

/// Validates credentials and resolves the matching user.
///
/// Only one login is in flight at a time: starting a new attempt (or calling
/// [`AuthGate::cancel_pending`]) makes any attempt still sleeping resolve to
/// [`AuthError::Superseded`].
#[derive(Debug, Clone)]
pub struct AuthGate {
    credentials: Arc<Vec<Credential>>,
    login_delay: Duration,
    generation: Arc<AtomicU64>,
}

impl AuthGate {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials: Arc::new(credentials),
            login_delay: Duration::from_millis(DEFAULT_LOGIN_DELAY_MS),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn login_delay(&self) -> Duration {
        self.login_delay
    }

    /// Synchronous credential check without latency.
    ///
    /// Unknown email, wrong password and a credential without a user record
    /// all yield the same [`AuthError::InvalidCredentials`].
    pub fn authenticate(&self, users: &[User], email: &str, password: &str) -> Result<User, AuthError> {
        let known = self
            .credentials
            .iter()
            .any(|c| c.email == email && c.password == password);
        if !known {
            warn!(email = %email, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        match users.iter().find(|u| u.email == email) {
            Some(user) => {
                info!(user_id = %user.id, "Login accepted");
                Ok(user.clone())
            }
            None => {
                warn!(email = %email, "Credential has no matching user record");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Authenticate after the configured delay.
    ///
    /// `users` is a snapshot taken by the caller so no workspace lock is held
    /// while sleeping.
    pub async fn login(&self, users: &[User], email: &str, password: &str) -> Result<User, AuthError> {
        self.login_with_ticket(users, email, password)
            .await
            .map(|(user, _)| user)
    }

    /// Like [`AuthGate::login`], also returning the attempt's ticket so the
    /// caller can check [`AuthGate::is_current`] again right before it
    /// commits the sign-in.
    pub async fn login_with_ticket(
        &self,
        users: &[User],
        email: &str,
        password: &str,
    ) -> Result<(User, u64), AuthError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, "Login attempt started");

        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        if !self.is_current(ticket) {
            debug!(ticket, "Login attempt superseded");
            return Err(AuthError::Superseded);
        }
        let user = self.authenticate(users, email, password)?;
        Ok((user, ticket))
    }

    /// True while no newer attempt or cancellation has happened since
    /// `ticket` was issued.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Invalidate any login still waiting out its delay.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
