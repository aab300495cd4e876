use chrono::{DateTime, Duration, Utc};

/// Bearer token obtained from a successful login.
///
/// The controller does not advertise a lifetime, so a token is considered
/// valid until the server rejects it.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    obtained_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: String) -> Self {
        Self {
            value,
            obtained_at: Utc::now(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.obtained_at
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Authentication state of one client instance.
///
/// `Authenticating` is not represented: a login is a single awaited call and
/// the state only changes once it has completed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Token),
    /// The controller rejected the configured credentials. Only new
    /// credentials leave this state.
    AuthFailed,
}

impl AuthState {
    pub fn token(&self) -> Option<&Token> {
        match self {
            AuthState::Authenticated(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AuthState::AuthFailed)
    }
}
