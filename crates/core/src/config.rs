use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Per-request timeout. Requests are never retried.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    pub daily_goal: f32,
    /// Preference scope holding the counter's reset date and total.
    pub scope: String,
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DAILY_GOAL: f32 = 300.0;
pub const DEFAULT_PROGRESS_SCOPE: &str = "home_prefs";

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder()
        .set_default("api.base_url", "http://localhost:8080/")?
        .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?
        .set_default("database.path", "data/foodlens.db")?
        .set_default("progress.daily_goal", DEFAULT_DAILY_GOAL as f64)?
        .set_default("progress.scope", DEFAULT_PROGRESS_SCOPE)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("FOODLENS").separator("__"));
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[api]\nbase_url = \"https://food.example.com/api/\"\n\n[database]\npath = \"/tmp/x.db\""
        )
        .unwrap();
        drop(f);

        let cfg = load(Some(&path.to_string_lossy())).unwrap();
        assert_eq!(cfg.api.base_url, "https://food.example.com/api/");
        assert_eq!(cfg.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.database.path, "/tmp/x.db");
        assert_eq!(cfg.progress.daily_goal, DEFAULT_DAILY_GOAL);
        assert_eq!(cfg.progress.scope, DEFAULT_PROGRESS_SCOPE);
    }
}
