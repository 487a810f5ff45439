use ahash::AHashMap;
use async_trait::async_trait;
use thiserror::Error;

/// User-store lookup failure. The notifier downgrades these to a null
/// reported_by_email; they never abort a dispatch.
#[derive(Debug, Error)]
#[error("user lookup failed: {0}")]
pub struct DirectoryError(pub String);

/// Resolves a platform user id (the record's `caller_id`) to an email
/// address. Ok(None) means the user is unknown or has no email on file.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn email_for(&self, user_id: &str) -> Result<Option<String>, DirectoryError>;
}

/// Directory that knows nobody. Default when no user store is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDirectory;

#[async_trait]
impl UserDirectory for NullDirectory {
    async fn email_for(&self, _user_id: &str) -> Result<Option<String>, DirectoryError> {
        Ok(None)
    }
}

/// Fixed id -> email table, useful for small deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    emails: AHashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(id.into(), email.into());
        self
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn email_for(&self, user_id: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self.emails.get(user_id).cloned())
    }
}
