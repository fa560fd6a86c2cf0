use anyhow::Result;
use std::sync::Mutex;

use crate::Database;

const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";

/// Durable slot for the refresh token. The access token is never persisted.
pub trait TokenVault: Send + Sync {
    fn load_refresh_token(&self) -> Result<Option<String>>;
    fn store_refresh_token(&self, token: &str) -> Result<()>;
    /// Idempotent.
    fn clear_refresh_token(&self) -> Result<()>;
}

impl TokenVault for Database {
    fn load_refresh_token(&self) -> Result<Option<String>> {
        self.get_value(REFRESH_TOKEN_KEY)
    }

    fn store_refresh_token(&self, token: &str) -> Result<()> {
        self.set_value(REFRESH_TOKEN_KEY, token)
    }

    fn clear_refresh_token(&self) -> Result<()> {
        self.delete_value(REFRESH_TOKEN_KEY).map(|_| ())
    }
}

/// Process-lifetime vault for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryVault {
    token: Mutex<Option<String>>,
}

impl MemoryVault {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|e| anyhow::anyhow!("vault lock poisoned: {}", e))
    }
}

impl TokenVault for MemoryVault {
    fn load_refresh_token(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn store_refresh_token(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear_refresh_token(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
