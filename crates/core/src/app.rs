use crate::account::{AccountService, TipsService};
use crate::analysis::AnalysisWorkflow;
use crate::analyze::AnalyzeService;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::progress::DailyProgress;
use crate::session::{SessionStore, SESSION_SCOPE};
use anyhow::Context;
use providers::http::{HttpConfig, HttpProvider};
use providers::{AccountProvider, FoodProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use storage::{connect, migrate, HistoryStore, Preferences};
use tracing::info;

/// Everything a front end needs, wired from configuration.
#[derive(Clone)]
pub struct App {
    pub config: AppConfig,
    accounts: Arc<dyn AccountProvider>,
    food: Arc<dyn FoodProvider>,
    pool: SqlitePool,
    progress: DailyProgress,
}

impl App {
    pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
        let provider = Arc::new(build_provider(&config)?);
        Self::with_providers(config, provider.clone(), provider).await
    }

    pub async fn with_providers(
        config: AppConfig,
        accounts: Arc<dyn AccountProvider>,
        food: Arc<dyn FoodProvider>,
    ) -> anyhow::Result<Self> {
        let pool = connect(&config.database.path).await.context("db connect")?;
        migrate(&pool).await.context("db migrate")?;
        info!(db = %config.database.path, api = %config.api.base_url, "app opened");
        let progress = DailyProgress::new(config.progress.daily_goal);
        Ok(Self {
            config,
            accounts,
            food,
            pool,
            progress,
        })
    }

    pub fn history(&self) -> HistoryStore {
        HistoryStore::new(self.pool.clone())
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(Preferences::new(self.pool.clone(), SESSION_SCOPE))
    }

    pub fn progress_prefs(&self) -> Preferences {
        Preferences::new(self.pool.clone(), &self.config.progress.scope)
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    /// Activates the daily counter against today's date.
    pub async fn activate_progress(&self) -> Result<bool, AppError> {
        self.progress.activate(&self.progress_prefs()).await
    }

    pub async fn save_progress(&self) -> Result<(), AppError> {
        self.progress.save(&self.progress_prefs()).await
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.accounts.clone(), self.sessions())
    }

    pub fn tips(&self) -> TipsService {
        TipsService::new(self.food.clone(), self.sessions())
    }

    pub async fn analyzer(&self) -> Result<AnalyzeService, AppError> {
        let session = self.sessions().require().await?;
        Ok(AnalyzeService::new(self.food.clone(), session))
    }

    /// Detail workflow for the current session, if any. Rendering and
    /// history work without one; the nutrition lookup needs it.
    pub async fn workflow(&self) -> Result<AnalysisWorkflow, AppError> {
        let session = self.sessions().current().await?;
        Ok(AnalysisWorkflow::new(
            self.food.clone(),
            self.history(),
            self.progress.clone(),
            session,
        ))
    }
}

pub fn build_provider(config: &AppConfig) -> anyhow::Result<HttpProvider> {
    let provider = HttpProvider::new(HttpConfig {
        base_url: config.api.base_url.clone(),
        timeout: Duration::from_secs(config.api.timeout_secs.max(1)),
    })?;
    Ok(provider)
}
