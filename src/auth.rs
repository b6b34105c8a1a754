/// Environment variable holding the shared dashboard password.
pub const PASSWORD_ENV: &str = "APP_PASSWORD";

/// How many wrong answers the interactive prompt tolerates.
pub const MAX_ATTEMPTS: usize = 3;

/// Result of one password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Denied,
}

/// A single shared secret. With no secret configured the gate is open.
#[derive(Clone)]
pub struct PasswordGate {
    secret: Option<String>,
}

// Never print the secret.
impl std::fmt::Debug for PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordGate")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PasswordGate {
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            log::info!("No dashboard password configured, access is open");
        }
        Self { secret }
    }

    pub fn is_open(&self) -> bool {
        self.secret.is_none()
    }

    fn check(&self, input: &str) -> bool {
        match &self.secret {
            None => true,
            Some(secret) => secrets_match(secret.as_bytes(), input.as_bytes()),
        }
    }
}

/// Compare without bailing out at the first differing byte.
fn secrets_match(expected: &[u8], given: &[u8]) -> bool {
    let mut diff = expected.len() ^ given.len();
    for (i, &b) in given.iter().enumerate() {
        let e = expected.get(i % expected.len().max(1)).copied().unwrap_or(0);
        diff |= usize::from(e ^ b);
    }
    diff == 0
}

/// Per-session authentication flag. Once granted it stays granted.
#[derive(Debug, Default)]
pub struct Session {
    authed: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authed(&self) -> bool {
        self.authed
    }

    pub fn attempt(&mut self, gate: &PasswordGate, input: &str) -> AuthOutcome {
        if self.authed || gate.check(input) {
            self.authed = true;
            AuthOutcome::Granted
        } else {
            log::warn!("Rejected dashboard password attempt");
            AuthOutcome::Denied
        }
    }
}
