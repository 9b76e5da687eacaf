/// Supplies the bearer token network calls are made with.
pub trait CredentialSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some_and(|t| !t.trim().is_empty())
    }
}

/// Token fixed at construction, e.g. read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl From<Option<String>> for StaticCredentials {
    fn from(token: Option<String>) -> Self {
        Self { token }
    }
}

impl CredentialSource for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
