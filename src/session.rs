use std::collections::HashMap;
use std::sync::Mutex;

use teloxide::types::UserId;

/// The single pending question for one operator. A session holds at most
/// one of these at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pending {
    #[default]
    None,
    AccessPassword,
    LeaveConfirmation,
    LeavePassword,
}

#[derive(Clone, Copy, Debug, Default)]
struct OperatorSession {
    authenticated: bool,
    pending: Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted,
    /// Correct password while already authenticated; harmless.
    AlreadyAuthenticated,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    PasswordRequested,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveAuthOutcome {
    Approved,
    Denied,
}

/// All operator sessions, keyed by operator id. State lives only in process
/// memory; a restart logs everyone out. Each operator's replies drive only
/// their own entry.
#[derive(Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<UserId, OperatorSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self, operator: UserId) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(&operator)
            .is_some_and(|s| s.authenticated)
    }

    pub fn pending(&self, operator: UserId) -> Pending {
        self.sessions
            .lock()
            .unwrap()
            .get(&operator)
            .map(|s| s.pending)
            .unwrap_or_default()
    }

    /// `/start` for an unauthenticated operator: ask for the access password.
    pub fn begin_login(&self, operator: UserId) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(operator).or_default();
        if !session.authenticated {
            session.pending = Pending::AccessPassword;
        }
    }

    pub fn submit_access_password(
        &self,
        operator: UserId,
        supplied: &str,
        expected: &str,
    ) -> AccessOutcome {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(operator).or_default();

        if supplied != expected {
            // Stay in AccessPassword so the next text is treated as a retry.
            return AccessOutcome::Denied;
        }
        if session.authenticated {
            session.pending = Pending::None;
            return AccessOutcome::AlreadyAuthenticated;
        }
        session.authenticated = true;
        session.pending = Pending::None;
        AccessOutcome::Granted
    }

    /// "Leave all chats" pressed. Returns false when the operator is not
    /// authenticated (nothing changes).
    pub fn begin_leave(&self, operator: UserId) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(operator).or_default();
        if !session.authenticated {
            return false;
        }
        session.pending = Pending::LeaveConfirmation;
        true
    }

    pub fn submit_leave_confirmation(
        &self,
        operator: UserId,
        affirmative: bool,
    ) -> ConfirmOutcome {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(operator).or_default();
        if affirmative {
            session.pending = Pending::LeavePassword;
            ConfirmOutcome::PasswordRequested
        } else {
            session.pending = Pending::None;
            ConfirmOutcome::Cancelled
        }
    }

    /// Either way the pending question is cleared; a wrong password cancels
    /// the action instead of re-prompting.
    pub fn submit_leave_password(
        &self,
        operator: UserId,
        supplied: &str,
        expected: &str,
    ) -> LeaveAuthOutcome {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.entry(operator).or_default();
        session.pending = Pending::None;
        if supplied == expected {
            LeaveAuthOutcome::Approved
        } else {
            LeaveAuthOutcome::Denied
        }
    }
}
