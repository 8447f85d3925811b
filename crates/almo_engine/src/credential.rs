use std::fmt;

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Supplies the current credential. Owned by the session layer; the engine
/// only reads it, once per operation.
pub trait TokenProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Fixed credential, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<Credential>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(Credential::bearer(token)))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}
