use std::sync::{Arc, Mutex, PoisonError};

use crate::core::outcome::AttemptOutcome;

/// Where the controller currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Warming,
    Scanning,
    Authenticated,
    Stopped,
}

/// Identity produced by a successful recognition attempt. Immutable once
/// created; confidence is a 0-100 match score.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    name: String,
    confidence: f32,
}

impl AuthenticatedUser {
    pub fn new(name: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 100.0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

pub const STATUS_WARMING: &str = "Look at the camera...";
pub const STATUS_SCANNING: &str = "Scanning for your face...";

/// Observable controller state. All mutation goes through methods so the
/// invariant holds: a user is present exactly when the phase is
/// `Authenticated`.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    phase: Phase,
    status_text: Option<String>,
    user: Option<AuthenticatedUser>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            status_text: None,
            user: None,
        }
    }
}

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub(crate) fn activate(&mut self) {
        self.phase = Phase::Warming;
        self.status_text = Some(STATUS_WARMING.to_string());
        self.user = None;
    }

    pub(crate) fn begin_scanning(&mut self) {
        self.phase = Phase::Scanning;
        self.status_text = Some(STATUS_SCANNING.to_string());
    }

    pub(crate) fn record_outcome(&mut self, outcome: &AttemptOutcome) {
        if let Some(line) = outcome.status_line() {
            self.status_text = Some(line.to_string());
        }
    }

    pub(crate) fn authenticate(&mut self, user: AuthenticatedUser) {
        self.phase = Phase::Authenticated;
        self.status_text = None;
        self.user = Some(user);
    }

    /// Explicit stop. Transient state is cleared; an authenticated user
    /// survives until logout.
    pub(crate) fn stop(&mut self) {
        if self.phase != Phase::Authenticated {
            self.phase = Phase::Stopped;
            self.user = None;
        }
        self.status_text = None;
    }

    pub(crate) fn logout(&mut self) {
        self.phase = Phase::Idle;
        self.status_text = None;
        self.user = None;
    }
}

/// Cheap-clone handle to the session, shared between the scheduler (the
/// only writer) and observers.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn logout(&self) {
        self.lock().logout();
    }

    pub(crate) fn update(&self, mutate: impl FnOnce(&mut Session)) {
        mutate(&mut self.lock());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_present_only_when_authenticated() {
        let mut session = Session::default();
        assert!(session.user().is_none());

        session.activate();
        session.begin_scanning();
        assert!(session.user().is_none());

        session.authenticate(AuthenticatedUser::new("Alice", 97.0));
        assert_eq!(session.phase(), Phase::Authenticated);
        assert_eq!(session.user().unwrap().name(), "Alice");

        session.logout();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.user().is_none());
    }

    #[test]
    fn stop_preserves_an_authenticated_user() {
        let mut session = Session::default();
        session.activate();
        session.authenticate(AuthenticatedUser::new("Alice", 97.0));

        session.stop();
        assert_eq!(session.phase(), Phase::Authenticated);
        assert!(session.user().is_some());
    }

    #[test]
    fn stop_clears_transient_state() {
        let mut session = Session::default();
        session.activate();
        session.begin_scanning();

        session.stop();
        assert_eq!(session.phase(), Phase::Stopped);
        assert!(session.status_text().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn reactivation_clears_a_previous_login() {
        let mut session = Session::default();
        session.activate();
        session.authenticate(AuthenticatedUser::new("Alice", 97.0));

        session.activate();
        assert_eq!(session.phase(), Phase::Warming);
        assert!(session.user().is_none());
        assert_eq!(session.status_text(), Some(STATUS_WARMING));
    }

    #[test]
    fn confidence_is_clamped_to_percentage_range() {
        assert_eq!(AuthenticatedUser::new("a", 130.0).confidence(), 100.0);
        assert_eq!(AuthenticatedUser::new("a", -5.0).confidence(), 0.0);
    }
}
