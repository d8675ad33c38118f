use crate::error::AppError;
use storage::Preferences;
use tracing::info;

pub const SESSION_SCOPE: &str = "session";
const TOKEN_KEY: &str = "token";

/// Bearer token issued at login.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    token: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Persists the current session between runs.
#[derive(Clone)]
pub struct SessionStore {
    prefs: Preferences,
}

impl SessionStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub async fn current(&self) -> Result<Option<AuthSession>, AppError> {
        let token = self.prefs.get(TOKEN_KEY).await?;
        Ok(token.filter(|t| !t.is_empty()).map(AuthSession::new))
    }

    pub async fn require(&self) -> Result<AuthSession, AppError> {
        self.current()
            .await?
            .ok_or_else(|| AppError::missing("not logged in"))
    }

    pub async fn start(&self, session: &AuthSession) -> Result<(), AppError> {
        self.prefs.put(TOKEN_KEY, session.token()).await?;
        info!("session started");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.prefs.remove(TOKEN_KEY).await?;
        info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_lifecycle() {
        let pool = storage::connect("sqlite::memory:").await.unwrap();
        storage::migrate(&pool).await.unwrap();
        let store = SessionStore::new(Preferences::new(pool, SESSION_SCOPE));

        assert!(store.current().await.unwrap().is_none());
        assert!(matches!(
            store.require().await,
            Err(AppError::MissingData(_))
        ));

        store.start(&AuthSession::new("abc")).await.unwrap();
        assert_eq!(store.require().await.unwrap().token(), "abc");

        store.clear().await.unwrap();
        assert!(store.current().await.unwrap().is_none());
    }
}
