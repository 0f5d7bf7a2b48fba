//! Write gate: is a challenge token required, and may the caller proceed?

use serde::Serialize;

/// Outcome of asking the gate about one write action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateDecision {
    /// The write may be sent.
    Proceed,
    /// A guest write needs a challenge token first.
    ChallengeRequired,
    /// Guest writes are disabled; the caller must log in.
    LoginRequired,
}

/// Pure decision logic over one session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionGate {
    authenticated: bool,
    guest_write_enabled: bool,
}

impl SessionGate {
    /// Build a gate from the two session flags it depends on.
    pub fn new(authenticated: bool, guest_write_enabled: bool) -> Self {
        Self {
            authenticated,
            guest_write_enabled,
        }
    }

    /// Whether the caller is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// True iff the caller is anonymous and the server allows guest writes.
    pub fn requires_challenge(&self) -> bool {
        !self.authenticated && self.guest_write_enabled
    }

    /// Whether a write may be sent given token availability.
    pub fn can_proceed(&self, has_token: bool) -> bool {
        self.authenticated || (self.guest_write_enabled && has_token)
    }

    /// Same as [`Self::can_proceed`], but says what is missing.
    pub fn decide(&self, has_token: bool) -> GateDecision {
        if self.authenticated {
            GateDecision::Proceed
        } else if !self.guest_write_enabled {
            GateDecision::LoginRequired
        } else if has_token {
            GateDecision::Proceed
        } else {
            GateDecision::ChallengeRequired
        }
    }
}
