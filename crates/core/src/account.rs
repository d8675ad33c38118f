use crate::error::AppError;
use crate::session::{AuthSession, SessionStore};
use providers::{
    AccountProvider, FoodProvider, ProfileForm, RegisterForm, Tip, UserProfile,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AccountService {
    api: Arc<dyn AccountProvider>,
    sessions: SessionStore,
}

impl AccountService {
    pub fn new(api: Arc<dyn AccountProvider>, sessions: SessionStore) -> Self {
        Self { api, sessions }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<Option<UserProfile>, AppError> {
        validate_credentials(&form.email, &form.password)?;
        let resp = self.api.register(form).await?;
        info!(email = %form.email, "registered");
        Ok(resp.data)
    }

    /// Logs in and stores the issued token as the current session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        validate_credentials(email, password)?;
        let resp = self.api.login(email, password).await?;
        let token = resp
            .data
            .map(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::missing(resp.message.unwrap_or_else(|| "login returned no token".into()))
            })?;
        let session = AuthSession::new(token);
        self.sessions.start(&session).await?;
        Ok(session)
    }

    /// Ends the remote session if there is one. The local session is
    /// cleared even when the remote call fails.
    pub async fn logout(&self) -> Result<(), AppError> {
        let remote = match self.sessions.current().await? {
            Some(session) => self.api.logout(session.token()).await.map(|_| ()),
            None => Ok(()),
        };
        self.sessions.clear().await?;
        if let Err(e) = &remote {
            warn!(error = %e, "remote logout failed");
        }
        remote.map_err(AppError::from)
    }

    pub async fn update_profile(
        &self,
        form: &ProfileForm,
    ) -> Result<Option<UserProfile>, AppError> {
        let session = self.sessions.require().await?;
        let resp = self.api.update_profile(session.token(), form).await?;
        Ok(resp.data)
    }
}

#[derive(Clone)]
pub struct TipsService {
    food: Arc<dyn FoodProvider>,
    sessions: SessionStore,
}

impl TipsService {
    pub fn new(food: Arc<dyn FoodProvider>, sessions: SessionStore) -> Self {
        Self { food, sessions }
    }

    pub async fn tips(&self) -> Result<Vec<Tip>, AppError> {
        let session = self.sessions.require().await?;
        Ok(self.food.tips(session.token()).await?.data)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::missing("a valid email is required"));
    }
    if password.is_empty() {
        return Err(AppError::missing("password is required"));
    }
    Ok(())
}
